//! Purpose: Library crate behind the `rowsplit` CLI: quote-aware delimited-text parsing.
//! Exports: `api` (splitter, row processor, schema seam, I/O wrapper, errors).
//! Role: Usable directly from Rust; the binary is a thin shell over `api`.
//! Invariants: Parsing is a single sequential pass with no state shared between calls.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
mod core;
