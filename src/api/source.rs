//! Purpose: Open delimited-text inputs (files or stdin) and hand them to the parser core.
//! Exports: `Source`, `ApiResult`, `open_source`, `parse_path`, `parse_path_with`.
//! Role: Thin I/O wrapper; contains no tokenizing or validation logic.
//! Invariants: Open failures map to `SourceUnavailable` with the path attached.
//! Invariants: `-` always means stdin.
#![allow(clippy::result_large_err)]

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::core::error::{Error, ErrorKind};
use crate::core::processor::{ParseOptions, parse_records, parse_rows};
use crate::core::schema::Schema;
use crate::core::splitter::Row;

pub type ApiResult<T> = Result<T, Error>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source {
    Stdin,
    Path(PathBuf),
}

impl Source {
    pub fn from_arg(arg: impl AsRef<Path>) -> Self {
        let path = arg.as_ref();
        if path == Path::new("-") {
            Source::Stdin
        } else {
            Source::Path(path.to_path_buf())
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Source::Stdin => "stdin".to_string(),
            Source::Path(path) => path.to_string_lossy().to_string(),
        }
    }
}

pub fn open_source(source: &Source) -> ApiResult<Box<dyn Read + Send>> {
    match source {
        Source::Stdin => Ok(Box::new(io::stdin())),
        Source::Path(path) => {
            let file = File::open(path).map_err(|err| open_error(err, path))?;
            Ok(Box::new(file))
        }
    }
}

fn open_error(err: io::Error, path: &Path) -> Error {
    let hint = match err.kind() {
        io::ErrorKind::NotFound => "Check the path; use `-` to read from stdin.",
        io::ErrorKind::PermissionDenied => "Check file permissions.",
        _ => "Check the path and filesystem.",
    };
    Error::new(ErrorKind::SourceUnavailable)
        .with_message("failed to open input")
        .with_path(path)
        .with_hint(hint)
        .with_source(err)
}

fn attach_path(err: Error, path: &Path) -> Error {
    match err.kind() {
        ErrorKind::SourceUnavailable | ErrorKind::Encoding if err.path().is_none() => {
            err.with_path(path)
        }
        _ => err,
    }
}

pub fn parse_path(path: impl AsRef<Path>, options: &ParseOptions) -> ApiResult<Vec<Row>> {
    let path = path.as_ref();
    let reader = open_source(&Source::from_arg(path))?;
    parse_rows(reader, options).map_err(|err| attach_path(err, path))
}

pub fn parse_path_with<S>(
    path: impl AsRef<Path>,
    schema: &S,
    options: &ParseOptions,
) -> ApiResult<Vec<S::Output>>
where
    S: Schema + ?Sized,
{
    let path = path.as_ref();
    let reader = open_source(&Source::from_arg(path))?;
    parse_records(reader, schema, options).map_err(|err| attach_path(err, path))
}

#[cfg(test)]
mod tests {
    use super::{Source, open_source, parse_path};
    use crate::core::error::ErrorKind;
    use crate::core::processor::ParseOptions;
    use std::path::PathBuf;

    #[test]
    fn dash_means_stdin() {
        assert_eq!(Source::from_arg("-"), Source::Stdin);
        assert_eq!(
            Source::from_arg("data.csv"),
            Source::Path(PathBuf::from("data.csv"))
        );
        assert_eq!(Source::Stdin.describe(), "stdin");
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("missing.csv");
        let err = match open_source(&Source::Path(missing.clone())) {
            Ok(_) => panic!("expected open failure"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
        assert_eq!(err.path(), Some(missing.as_path()));
        assert!(err.hint().is_some());
    }

    #[test]
    fn encoding_errors_carry_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("bad.csv");
        std::fs::write(&path, b"ok\n\xff\n").expect("write");
        let err = parse_path(&path, &ParseOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert_eq!(err.path(), Some(path.as_path()));
    }
}
