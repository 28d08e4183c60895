//! Purpose: Define the public Rust API boundary for rowsplit.
//! Exports: Parser core types and operations, the file/stdin wrapper, and column schemas.
//! Role: Public, additive-only surface; hides the internal `core` module layout.
//! Invariants: This module is the only public path to the splitter and processor.
//! Invariants: Every entry point returns `Result<_, Error>`; nothing panics on bad input.

pub mod columns;
mod source;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::dialect::Dialect;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::processor::{
    NoSchema, ParseOptions, ParseResult, Records, parse, parse_records, parse_rows,
};
pub use crate::core::schema::{Rejection, Schema};
pub use crate::core::splitter::{Row, RowSplitter, split_str};
pub use columns::{ColumnSchema, ColumnType, Typed};
pub use source::{ApiResult, Source, open_source, parse_path, parse_path_with};
