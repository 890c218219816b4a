//! Rows, schemas and numeric coercion
//!
//! Summarizers never own rows. They resolve column names to indices once,
//! against a [`Schema`], and then read values by index from each [`Row`].

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::traits::ConfigError;

/// Logical column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataType {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
}

impl DataType {
    /// Whether values of this type can be summarized
    pub fn is_numeric(&self) -> bool {
        self.numeric_coercion().is_some()
    }

    /// Look up the function that converts values of this type to `f64`
    ///
    /// Returns `None` for types without a numeric interpretation. A numeric
    /// column may still carry any numeric variant, all of which are widened to
    /// `f64`. Nulls and non-numeric values coerce to NaN.
    pub fn numeric_coercion(&self) -> Option<Coercion> {
        match self {
            DataType::Int32 | DataType::Int64 | DataType::Float32 | DataType::Float64 => {
                Some(coerce_numeric)
            }
            DataType::Bool | DataType::String => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "BOOLEAN",
            DataType::Int32 => "INT",
            DataType::Int64 => "BIGINT",
            DataType::Float32 => "REAL",
            DataType::Float64 => "DOUBLE",
            DataType::String => "STRING",
        };
        f.write_str(name)
    }
}

/// Converts one value to the common floating point representation
pub type Coercion = fn(&Value) -> f64;

fn coerce_numeric(value: &Value) -> f64 {
    match value {
        Value::Int32(v) => *v as f64,
        Value::Int64(v) => *v as f64,
        Value::Float32(v) => *v as f64,
        Value::Float64(v) => *v,
        Value::Null | Value::Bool(_) | Value::String(_) => f64::NAN,
    }
}

/// A single cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
}

impl Value {
    /// The type of this value, `None` for null
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(DataType::Bool),
            Value::Int32(_) => Some(DataType::Int32),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float32(_) => Some(DataType::Float32),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::String),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

/// A fixed-schema row
pub type Row = Vec<Value>;

/// Named, typed column
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of fields describing every row in a stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolve a column name to its position
    pub fn index_of(&self, name: &str) -> Result<usize, ConfigError> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| ConfigError::UnknownColumn {
                name: name.to_string(),
            })
    }

    /// Resolve a column name to a cached reader of its numeric value
    pub fn numeric_column(&self, name: &str) -> Result<ColumnReader, ConfigError> {
        let index = self.index_of(name)?;
        let data_type = self.fields[index].data_type;
        let coerce = data_type
            .numeric_coercion()
            .ok_or_else(|| ConfigError::NonNumericColumn {
                name: name.to_string(),
                data_type,
            })?;
        Ok(ColumnReader { index, coerce })
    }
}

/// Reads one numeric column from rows by its resolved index
#[derive(Clone, Copy)]
pub struct ColumnReader {
    index: usize,
    coerce: Coercion,
}

impl ColumnReader {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Read the column from `row`; missing cells read as NaN
    #[inline]
    pub fn read(&self, row: &[Value]) -> f64 {
        row.get(self.index).map_or(f64::NAN, self.coerce)
    }
}

impl fmt::Debug for ColumnReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnReader")
            .field("index", &self.index)
            .finish()
    }
}
