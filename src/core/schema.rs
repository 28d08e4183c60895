//! Purpose: Define the validator capability the row processor applies to each row.
//! Exports: `Schema`, `Rejection`.
//! Role: Seam between the parser core and caller-owned typing rules.
//! Invariants: The core only borrows a schema; it never stores or clones it.
//! Notes: Any `Fn(&[String]) -> Result<T, Rejection>` is a schema.
use std::fmt;

pub trait Schema {
    type Output;

    fn validate(&self, row: &[String]) -> Result<Self::Output, Rejection>;
}

impl<F, T> Schema for F
where
    F: Fn(&[String]) -> Result<T, Rejection>,
{
    type Output = T;

    fn validate(&self, row: &[String]) -> Result<T, Rejection> {
        self(row)
    }
}

/// Why a schema refused a row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rejection {
    reason: String,
    column: Option<usize>,
}

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            column: None,
        }
    }

    pub fn at_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(f, "column {column}: {}", self.reason),
            None => f.write_str(&self.reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Rejection, Schema};

    #[test]
    fn closures_are_schemas() {
        let first_len = |row: &[String]| -> Result<usize, Rejection> {
            row.first()
                .map(String::len)
                .ok_or_else(|| Rejection::new("empty row"))
        };
        assert_eq!(first_len.validate(&["abc".to_string()]), Ok(3));
        assert_eq!(first_len.validate(&[]).unwrap_err().reason(), "empty row");
    }

    #[test]
    fn rejection_display_names_column() {
        let rejection = Rejection::new("not a number").at_column(1);
        assert_eq!(rejection.to_string(), "column 1: not a number");
        assert_eq!(Rejection::new("bad").to_string(), "bad");
    }
}
