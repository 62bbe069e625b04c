//! Result set schema

use std::fmt;

use crate::wire::{FieldWire, TableSchemaWire};

/// Column type as named in the table schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int64,
    Float64,
    Bool,
    Timestamp,
    Date,
    DateTime,
    Time,
    Numeric,
    Bytes,
    Record,
    /// Type names without a dedicated variant (`GEOGRAPHY`, `JSON`, ...)
    Other(String),
}

impl FieldType {
    /// Accepts both legacy (`INTEGER`, `BOOLEAN`) and standard SQL names.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "STRING" => Self::String,
            "INTEGER" | "INT64" => Self::Int64,
            "FLOAT" | "FLOAT64" => Self::Float64,
            "BOOLEAN" | "BOOL" => Self::Bool,
            "TIMESTAMP" => Self::Timestamp,
            "DATE" => Self::Date,
            "DATETIME" => Self::DateTime,
            "TIME" => Self::Time,
            "NUMERIC" | "BIGNUMERIC" => Self::Numeric,
            "BYTES" => Self::Bytes,
            "RECORD" | "STRUCT" => Self::Record,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "STRING",
            Self::Int64 => "INT64",
            Self::Float64 => "FLOAT64",
            Self::Bool => "BOOL",
            Self::Timestamp => "TIMESTAMP",
            Self::Date => "DATE",
            Self::DateTime => "DATETIME",
            Self::Time => "TIME",
            Self::Numeric => "NUMERIC",
            Self::Bytes => "BYTES",
            Self::Record => "RECORD",
            Self::Other(name) => name,
        })
    }
}

/// One column of a result set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    field_type: FieldType,
    repeated: bool,
}

impl Field {
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            repeated: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// `mode: REPEATED` columns carry arrays.
    #[must_use]
    pub const fn is_repeated(&self) -> bool {
        self.repeated
    }
}

impl From<FieldWire> for Field {
    fn from(wire: FieldWire) -> Self {
        Self {
            name: wire.name,
            field_type: FieldType::parse(&wire.field_type),
            repeated: wire.mode.as_deref() == Some("REPEATED"),
        }
    }
}

/// Ordered column list; positions match the cells of every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    #[must_use]
    pub const fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of the first column called `name` (case-insensitive, like SQL).
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }
}

impl From<TableSchemaWire> for Schema {
    fn from(wire: TableSchemaWire) -> Self {
        Self::new(wire.fields.into_iter().map(Field::from).collect())
    }
}
