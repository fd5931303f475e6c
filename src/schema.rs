//! CREATE TABLE statement builder.

use crate::error::{PurrError, Result};
use std::fmt;
use std::str::FromStr;

/// Column types offered by the table generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Blob,
    Varchar,
    SmallInt,
    Float,
    Double,
    Boolean,
    Currency,
    Date,
    Time,
    Timestamp,
    Binary,
}

impl ColumnType {
    pub const ALL: [ColumnType; 14] = [
        ColumnType::Text,
        ColumnType::Integer,
        ColumnType::Real,
        ColumnType::Blob,
        ColumnType::Varchar,
        ColumnType::SmallInt,
        ColumnType::Float,
        ColumnType::Double,
        ColumnType::Boolean,
        ColumnType::Currency,
        ColumnType::Date,
        ColumnType::Time,
        ColumnType::Timestamp,
        ColumnType::Binary,
    ];

    /// Lower-case name as written into the generated statement.
    pub fn sql_name(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Real => "real",
            ColumnType::Blob => "blob",
            ColumnType::Varchar => "varchar",
            ColumnType::SmallInt => "smallint",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
            ColumnType::Boolean => "boolean",
            ColumnType::Currency => "currency",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Binary => "binary",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

impl FromStr for ColumnType {
    type Err = PurrError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        ColumnType::ALL
            .into_iter()
            .find(|t| t.sql_name().eq_ignore_ascii_case(wanted))
            .or(match wanted.to_ascii_lowercase().as_str() {
                "int" => Some(ColumnType::Integer),
                "bool" => Some(ColumnType::Boolean),
                _ => None,
            })
            .ok_or_else(|| PurrError::Schema(format!("unknown column type '{}'", wanted)))
    }
}

/// One row of the table generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: ColumnType,
    pub primary_key: bool,
    pub autoincrement: bool,
    pub not_null: bool,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            primary_key: false,
            autoincrement: false,
            not_null: false,
        }
    }

    /// Parse `name:type[:pk][:ai][:nn]`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parts = text.split(':');
        let name = parts.next().unwrap_or_default().trim();
        let ty = match parts.next() {
            Some(t) => t.parse()?,
            None => ColumnType::Text,
        };
        let mut column = ColumnSpec::new(name, ty);
        for flag in parts {
            match flag.trim().to_ascii_lowercase().as_str() {
                "pk" => column.primary_key = true,
                "ai" => column.autoincrement = true,
                "nn" => column.not_null = true,
                other => {
                    return Err(PurrError::Schema(format!(
                        "unknown column flag '{}' (expected pk, ai or nn)",
                        other
                    )));
                }
            }
        }
        Ok(column)
    }

    fn definition(&self) -> String {
        let mut def = format!("{} {}", self.name, self.ty);
        if self.primary_key {
            def.push_str(" primary key");
        }
        if self.autoincrement {
            def.push_str(" autoincrement");
        }
        if self.not_null {
            def.push_str(" not null");
        }
        def
    }
}

/// A table definition to turn into a CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSpec {
    pub name: String,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    /// Render the statement, validating names first.
    pub fn generate(&self) -> Result<String> {
        if self.name.trim().is_empty() {
            return Err(PurrError::Schema(
                "please provide a table name in order to create a table".to_string(),
            ));
        }
        if self.columns.is_empty() {
            return Err(PurrError::Schema(
                "a table needs at least one column".to_string(),
            ));
        }
        if self.columns.iter().any(|c| c.name.trim().is_empty()) {
            return Err(PurrError::Schema("every column needs a name".to_string()));
        }

        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("\t{}", c.definition()))
            .collect();
        Ok(format!(
            "create table {}{}\n( \n{}\n)",
            if self.if_not_exists { "if not exists " } else { "" },
            self.name.trim(),
            columns.join(",\n")
        ))
    }
}
