// Parser core: tokenizing, row processing, schema seam, and error modeling.
pub mod dialect;
pub mod error;
pub mod processor;
pub mod schema;
pub mod splitter;
