//! Purpose: Ready-made positional schema that coerces each field to a declared column type.
//! Exports: `ColumnType`, `ColumnSchema`, `Typed`, `parse_column_list`.
//! Role: Convenience `Schema` for callers (and the CLI) that want typed tuples without writing one.
//! Invariants: Arity is exact unless extra trailing fields are explicitly allowed.
//! Invariants: String columns keep field text verbatim; numeric/boolean coercion ignores
//! surrounding whitespace.
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

use crate::core::error::{Error, ErrorKind};
use crate::core::schema::{Rejection, Schema};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
        }
    }

    fn coerce(self, field: &str) -> Result<Value, String> {
        let text = field.trim();
        match self {
            ColumnType::String => Ok(Value::String(field.to_string())),
            ColumnType::Integer => text
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("expected an integer, got {field:?}")),
            ColumnType::Float => text
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("expected a finite number, got {field:?}")),
            ColumnType::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "0" => Ok(Value::Bool(false)),
                _ => Err(format!("expected a boolean, got {field:?}")),
            },
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(ColumnType::String),
            "int" | "integer" => Ok(ColumnType::Integer),
            "float" | "number" => Ok(ColumnType::Float),
            "bool" | "boolean" => Ok(ColumnType::Boolean),
            other => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("unknown column type {other:?}"))
                .with_hint("Use string, int, float, or bool.")),
        }
    }
}

/// Parse a comma-separated column list such as `string,int,float`.
pub fn parse_column_list(list: &str) -> Result<Vec<ColumnType>, Error> {
    if list.trim().is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("column list is empty"));
    }
    list.split(',').map(str::parse).collect()
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnSchema {
    columns: Vec<ColumnType>,
    allow_extra: bool,
}

impl ColumnSchema {
    pub fn new(columns: impl Into<Vec<ColumnType>>) -> Self {
        Self {
            columns: columns.into(),
            allow_extra: false,
        }
    }

    /// Accept rows longer than the declared columns, ignoring the extra fields.
    pub fn allow_extra_fields(mut self) -> Self {
        self.allow_extra = true;
        self
    }

    pub fn columns(&self) -> &[ColumnType] {
        &self.columns
    }

    /// Deserialize the coerced values into `T` (a tuple, tuple struct, or sequence type).
    pub fn typed<T: DeserializeOwned>(self) -> Typed<T> {
        Typed {
            inner: self,
            _target: PhantomData,
        }
    }

    fn coerce_row(&self, row: &[String]) -> Result<Vec<Value>, Rejection> {
        let expected = self.columns.len();
        if row.len() < expected {
            return Err(Rejection::new(format!(
                "expected {expected} fields, got {}",
                row.len()
            )));
        }
        if row.len() > expected && !self.allow_extra {
            return Err(Rejection::new(format!(
                "expected {expected} fields, got {}",
                row.len()
            ))
            .at_column(expected));
        }
        self.columns
            .iter()
            .zip(row)
            .enumerate()
            .map(|(idx, (column, field))| {
                column
                    .coerce(field)
                    .map_err(|reason| Rejection::new(reason).at_column(idx))
            })
            .collect()
    }
}

impl Schema for ColumnSchema {
    type Output = Value;

    fn validate(&self, row: &[String]) -> Result<Value, Rejection> {
        self.coerce_row(row).map(Value::Array)
    }
}

pub struct Typed<T> {
    inner: ColumnSchema,
    _target: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Schema for Typed<T> {
    type Output = T;

    fn validate(&self, row: &[String]) -> Result<T, Rejection> {
        let values = self.inner.coerce_row(row)?;
        serde_json::from_value(Value::Array(values))
            .map_err(|err| Rejection::new(format!("row does not fit target type: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnSchema, ColumnType, parse_column_list};
    use crate::core::error::ErrorKind;
    use crate::core::schema::Schema;
    use serde::Deserialize;
    use serde_json::json;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|field| field.to_string()).collect()
    }

    #[test]
    fn coerces_each_column() {
        let schema = ColumnSchema::new([
            ColumnType::String,
            ColumnType::Integer,
            ColumnType::Float,
            ColumnType::Boolean,
        ]);
        let value = schema
            .validate(&row(&["Alice", "23", " 4.0", "yes"]))
            .expect("valid");
        assert_eq!(value, json!(["Alice", 23, 4.0, true]));
    }

    #[test]
    fn rejection_names_failing_column() {
        let schema = ColumnSchema::new([ColumnType::String, ColumnType::Integer]);
        let rejection = schema.validate(&row(&["Bob", "thirty"])).unwrap_err();
        assert_eq!(rejection.column(), Some(1));
        assert!(rejection.reason().contains("thirty"));
    }

    #[test]
    fn arity_is_exact_unless_extra_allowed() {
        let schema = ColumnSchema::new([ColumnType::String]);
        assert_eq!(schema.columns(), &[ColumnType::String]);
        assert!(schema.validate(&row(&[])).is_err());
        let too_long = schema.validate(&row(&["a", "b"])).unwrap_err();
        assert_eq!(too_long.column(), Some(1));

        let lenient = schema.allow_extra_fields();
        assert_eq!(lenient.validate(&row(&["a", "b"])), Ok(json!(["a"])));
    }

    #[test]
    fn non_finite_float_is_rejected() {
        let schema = ColumnSchema::new([ColumnType::Float]);
        assert!(schema.validate(&row(&["NaN"])).is_err());
        assert!(schema.validate(&row(&["inf"])).is_err());
    }

    #[test]
    fn typed_deserializes_into_tuple_struct() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Person(String, u32);

        let schema = ColumnSchema::new([ColumnType::String, ColumnType::Integer]).typed::<Person>();
        assert_eq!(
            schema.validate(&row(&["Nim", "22"])),
            Ok(Person("Nim".to_string(), 22))
        );
        let negative = schema.validate(&row(&["Nim", "-1"])).unwrap_err();
        assert!(negative.reason().contains("target type"));
    }

    #[test]
    fn column_list_parses_aliases() {
        assert_eq!(
            parse_column_list("str, int,number,bool").expect("list"),
            vec![
                ColumnType::String,
                ColumnType::Integer,
                ColumnType::Float,
                ColumnType::Boolean
            ]
        );
        let err = parse_column_list("string,date").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(parse_column_list(" ").is_err());
    }
}
