//! Purpose: Turn split rows into the caller's result: raw rows or schema-validated records.
//! Exports: `ParseOptions`, `ParseResult`, `Records`, `NoSchema`, `parse`, `parse_rows`, `parse_records`.
//! Role: Row processor on top of `RowSplitter`; owns header skipping and fail-fast validation.
//! Invariants: Output order equals input row order; rows are handled one at a time.
//! Invariants: The first rejected row aborts the parse; no partial collection is returned.
//! Invariants: The header row (when enabled) is neither counted nor validated.
use std::io::Read;

use tracing::debug;

use crate::core::dialect::Dialect;
use crate::core::error::{Error, ErrorKind};
use crate::core::schema::{Rejection, Schema};
use crate::core::splitter::{Row, RowSplitter};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ParseOptions {
    /// Discard the first non-empty row.
    pub header: bool,
    pub dialect: Dialect,
}

impl ParseOptions {
    pub fn header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParseResult<T> {
    Rows(Vec<Row>),
    Records(Vec<T>),
}

impl<T> ParseResult<T> {
    pub fn len(&self) -> usize {
        match self {
            ParseResult::Rows(rows) => rows.len(),
            ParseResult::Records(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            ParseResult::Rows(rows) => Some(rows),
            ParseResult::Records(_) => None,
        }
    }

    pub fn into_records(self) -> Option<Vec<T>> {
        match self {
            ParseResult::Records(records) => Some(records),
            ParseResult::Rows(_) => None,
        }
    }
}

/// Schema type to name when calling [`parse`] without a schema.
pub type NoSchema = fn(&[String]) -> Result<Row, Rejection>;

/// Lazily validated records. Yields at most one error, after which it is exhausted.
pub struct Records<'s, R: Read, S: Schema + ?Sized> {
    rows: RowSplitter<R>,
    schema: &'s S,
    skip_header: bool,
    index: u64,
    failed: bool,
}

impl<'s, R: Read, S: Schema + ?Sized> Records<'s, R, S> {
    pub fn new(rows: RowSplitter<R>, schema: &'s S, header: bool) -> Self {
        Self {
            rows,
            schema,
            skip_header: header,
            index: 0,
            failed: false,
        }
    }
}

impl<R: Read, S: Schema + ?Sized> Iterator for Records<'_, R, S> {
    type Item = Result<S::Output, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            };
            if self.skip_header {
                self.skip_header = false;
                continue;
            }
            let index = self.index;
            self.index += 1;
            return match self.schema.validate(&row) {
                Ok(record) => Some(Ok(record)),
                Err(rejection) => {
                    self.failed = true;
                    Some(Err(rejection_error(rejection, index, self.rows.row_line())))
                }
            };
        }
    }
}

fn rejection_error(rejection: Rejection, row: u64, line: u64) -> Error {
    let mut err = Error::new(ErrorKind::SchemaValidation)
        .with_message(format!("row {row} failed validation: {}", rejection.reason()))
        .with_row(row)
        .with_line(line);
    if let Some(column) = rejection.column() {
        err = err.with_column(column);
    }
    err
}

pub fn parse_rows<R: Read>(reader: R, options: &ParseOptions) -> Result<Vec<Row>, Error> {
    let mut skip_header = options.header;
    let mut rows = Vec::new();
    for row in RowSplitter::new(reader, options.dialect)? {
        let row = row?;
        if skip_header {
            skip_header = false;
            continue;
        }
        rows.push(row);
    }
    debug!(rows = rows.len(), header = options.header, "parsed rows");
    Ok(rows)
}

pub fn parse_records<R, S>(
    reader: R,
    schema: &S,
    options: &ParseOptions,
) -> Result<Vec<S::Output>, Error>
where
    R: Read,
    S: Schema + ?Sized,
{
    let rows = RowSplitter::new(reader, options.dialect)?;
    let records = Records::new(rows, schema, options.header).collect::<Result<Vec<_>, _>>()?;
    debug!(
        records = records.len(),
        header = options.header,
        "parsed records"
    );
    Ok(records)
}

/// Parse into raw rows when `schema` is `None`, validated records otherwise.
pub fn parse<R, S>(
    reader: R,
    schema: Option<&S>,
    options: &ParseOptions,
) -> Result<ParseResult<S::Output>, Error>
where
    R: Read,
    S: Schema + ?Sized,
{
    match schema {
        Some(schema) => parse_records(reader, schema, options).map(ParseResult::Records),
        None => parse_rows(reader, options).map(ParseResult::Rows),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io::{self, Read};

    use super::{NoSchema, ParseOptions, ParseResult, Records, parse, parse_records, parse_rows};
    use crate::core::dialect::Dialect;
    use crate::core::error::ErrorKind;
    use crate::core::schema::Rejection;
    use crate::core::splitter::RowSplitter;

    fn name_age(row: &[String]) -> Result<(String, u32), Rejection> {
        let [name, age] = row else {
            return Err(Rejection::new(format!("expected 2 fields, got {}", row.len())));
        };
        let age = age
            .parse()
            .map_err(|_| Rejection::new(format!("not a number: {age:?}")).at_column(1))?;
        Ok((name.clone(), age))
    }

    #[test]
    fn rows_without_header() {
        let rows = parse_rows(
            "name,age\nAlice,23\nBob,thirty\n".as_bytes(),
            &ParseOptions::default(),
        )
        .expect("parse");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], vec!["Bob", "thirty"]);
    }

    #[test]
    fn header_skips_first_non_empty_row() {
        let rows = parse_rows(
            "\n\nname,age\nAlice,23\n".as_bytes(),
            &ParseOptions::default().header(true),
        )
        .expect("parse");
        assert_eq!(rows, vec![vec!["Alice", "23"]]);
    }

    #[test]
    fn header_is_not_validated() {
        let records = parse_records(
            "name,age\nAlice,23\nCharlie,25\n".as_bytes(),
            &name_age,
            &ParseOptions::default().header(true),
        )
        .expect("parse");
        assert_eq!(
            records,
            vec![("Alice".to_string(), 23), ("Charlie".to_string(), 25)]
        );
    }

    #[test]
    fn schema_failure_is_fail_fast() {
        let calls = Cell::new(0);
        let counting = |row: &[String]| {
            calls.set(calls.get() + 1);
            name_age(row)
        };
        let err = parse_records(
            "Alice,23\nBob,thirty\nCharlie,25\n".as_bytes(),
            &counting,
            &ParseOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaValidation);
        assert_eq!(err.row(), Some(1));
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.column(), Some(1));
        assert!(err.message().unwrap().contains("thirty"));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn failing_row_index_counts_after_header() {
        let err = parse_records(
            "name,age\nAlice,23\nBob\n".as_bytes(),
            &name_age,
            &ParseOptions::default().header(true),
        )
        .unwrap_err();
        assert_eq!(err.row(), Some(1));
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.column(), None);
    }

    #[test]
    fn records_iterator_stops_after_error() {
        let rows = RowSplitter::new("x,1\ny,no\nz,3\n".as_bytes(), Dialect::default())
            .expect("splitter");
        let mut records = Records::new(rows, &name_age, false);
        assert!(records.next().unwrap().is_ok());
        assert!(records.next().unwrap().is_err());
        assert!(records.next().is_none());
    }

    #[test]
    fn splitter_error_aborts_records() {
        let dialect = Dialect::default().strict(true);
        let err = parse_records(
            "a,1\n\"b,2\n".as_bytes(),
            &name_age,
            &ParseOptions::default().dialect(dialect),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedQuoting);
    }

    #[test]
    fn parse_selects_result_shape() {
        let opts = ParseOptions::default();
        let rows = parse("a,1\n".as_bytes(), None::<&NoSchema>, &opts).expect("rows");
        assert_eq!(rows, ParseResult::Rows(vec![vec!["a".into(), "1".into()]]));

        let records = parse("a,1\n".as_bytes(), Some(&name_age), &opts).expect("records");
        assert_eq!(records.len(), 1);
        assert_eq!(records.into_records().unwrap()[0], ("a".to_string(), 1));
    }

    // Hands out `data` a few bytes at a time, then fails every read.
    struct FailingReader {
        data: &'static [u8],
        chunk: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::Error::other("disk gone"));
            }
            let take = self.chunk.min(buf.len()).min(self.data.len());
            buf[..take].copy_from_slice(&self.data[..take]);
            self.data = &self.data[take..];
            Ok(take)
        }
    }

    #[test]
    fn read_failure_mid_stream_aborts_parse() {
        let reader = FailingReader {
            data: b"a,b\nc,d\n",
            chunk: 3,
        };
        let err = parse_rows(reader, &ParseOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
        assert_eq!(err.line(), Some(3));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn splitter_is_exhausted_after_read_failure() {
        let reader = FailingReader {
            data: b"a,b\nc,d\n",
            chunk: 3,
        };
        let mut rows = RowSplitter::new(reader, Dialect::default()).expect("splitter");
        assert_eq!(rows.next().unwrap().unwrap(), vec!["a", "b"]);
        assert_eq!(rows.next().unwrap().unwrap(), vec!["c", "d"]);
        let err = rows.next().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
        assert!(rows.next().is_none());
    }

    #[test]
    fn empty_input_with_schema_is_empty() {
        let records =
            parse_records("".as_bytes(), &name_age, &ParseOptions::default()).expect("parse");
        assert!(records.is_empty());
    }
}
