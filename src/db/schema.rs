//! Database schema types for loanlens.
//!
//! Represents the structure of a database including tables, columns,
//! and foreign keys. The schema feeds two consumers: the agent system
//! prompt and the table-metadata endpoints.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Represents the complete schema of a database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    /// All tables in the schema.
    pub tables: Vec<Table>,

    /// Foreign key relationships between tables.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Table names in introspection order.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    /// Formats a single table the same way [`format_for_agent`] does,
    /// for schema-lookup tool output. Returns None for unknown tables.
    ///
    /// [`format_for_agent`]: Self::format_for_agent
    pub fn format_table_for_agent(&self, name: &str) -> Option<String> {
        self.table(name).map(|table| self.format_table(table))
    }

    /// Formats the schema for inclusion in the agent system prompt.
    ///
    /// Produces a human-readable representation that helps the agent
    /// pick tables and joins. Foreign keys are listed explicitly since
    /// join paths are where generated queries most often go wrong.
    pub fn format_for_agent(&self) -> String {
        let tables_text = self
            .tables
            .iter()
            .map(|table| self.format_table(table))
            .collect::<Vec<_>>()
            .join("");

        let foreign_keys_text = if self.foreign_keys.is_empty() {
            String::new()
        } else {
            let fk_lines = self
                .foreign_keys
                .iter()
                .map(|fk| {
                    format!(
                        "  - {}.{} -> {}.{}\n",
                        fk.from_table,
                        fk.from_columns.join(", "),
                        fk.to_table,
                        fk.to_columns.join(", ")
                    )
                })
                .collect::<Vec<_>>()
                .join("");
            format!("Foreign Keys:\n{}", fk_lines)
        };

        format!("Database Schema:\n\n{}{}", tables_text, foreign_keys_text)
    }

    fn format_table(&self, table: &Table) -> String {
        let column_lines = table
            .columns
            .iter()
            .map(|column| self.format_column(table, column))
            .collect::<Vec<_>>()
            .join("");

        format!("Table: {}\n{}\n", table.name, column_lines)
    }

    fn format_column(&self, table: &Table, column: &Column) -> String {
        let mut annotations = Vec::new();
        if table.primary_key.contains(&column.name) {
            annotations.push("PK".to_string());
        }
        if !column.is_nullable {
            annotations.push("NOT NULL".to_string());
        }
        for fk in self
            .foreign_keys
            .iter()
            .filter(|fk| fk.from_table == table.name && fk.from_columns.contains(&column.name))
        {
            annotations.push(format!(
                "FK -> {}.{}",
                fk.to_table,
                fk.to_columns.first().map(String::as_str).unwrap_or("")
            ));
        }

        match (annotations.is_empty(), &column.default) {
            (false, Some(default)) => format!(
                "  - {}: {} ({}, DEFAULT {})\n",
                column.name,
                column.data_type,
                annotations.join(", "),
                default
            ),
            (false, None) => format!(
                "  - {}: {} ({})\n",
                column.name,
                column.data_type,
                annotations.join(", ")
            ),
            (true, Some(default)) => format!(
                "  - {}: {} (DEFAULT {})\n",
                column.name, column.data_type, default
            ),
            (true, None) => format!("  - {}: {}\n", column.name, column.data_type),
        }
    }

    /// Computes a hash of the schema content for prompt-cache
    /// invalidation.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tables.len().hash(&mut hasher);
        for table in &self.tables {
            table.name.hash(&mut hasher);
            table.columns.len().hash(&mut hasher);
            for col in &table.columns {
                col.name.hash(&mut hasher);
                col.data_type.hash(&mut hasher);
                col.is_nullable.hash(&mut hasher);
                col.default.hash(&mut hasher);
            }
            table.primary_key.hash(&mut hasher);
        }
        self.foreign_keys.len().hash(&mut hasher);
        for fk in &self.foreign_keys {
            fk.from_table.hash(&mut hasher);
            fk.from_columns.hash(&mut hasher);
            fk.to_table.hash(&mut hasher);
            fk.to_columns.hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Represents a database table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in the table.
    pub columns: Vec<Column>,

    /// Column names that form the primary key.
    pub primary_key: Vec<String>,
}

impl Table {
    /// Creates a new table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }
}

/// Represents a column in a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Data type (e.g., "integer", "varchar(255)").
    pub data_type: String,

    /// Whether the column allows NULL values.
    pub is_nullable: bool,

    /// Default value expression, if any.
    pub default: Option<String>,
}

impl Column {
    /// Creates a new column with the given name and data type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default: None,
        }
    }

    /// Sets whether the column is nullable.
    pub fn nullable(self, nullable: bool) -> Self {
        Self {
            is_nullable: nullable,
            ..self
        }
    }

    /// Sets the default value.
    pub fn with_default(self, default: impl Into<String>) -> Self {
        Self {
            default: Some(default.into()),
            ..self
        }
    }
}

/// Represents a foreign key relationship between tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Source table name.
    pub from_table: String,

    /// Source column names.
    pub from_columns: Vec<String>,

    /// Target table name.
    pub to_table: String,

    /// Target column names.
    pub to_columns: Vec<String>,
}

impl ForeignKey {
    /// Creates a new foreign key relationship.
    pub fn new(
        from_table: impl Into<String>,
        from_columns: Vec<String>,
        to_table: impl Into<String>,
        to_columns: Vec<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_columns,
            to_table: to_table.into(),
            to_columns,
        }
    }
}
