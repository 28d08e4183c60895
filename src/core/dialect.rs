//! Purpose: Describe how a delimited-text source is tokenized.
//! Exports: `Dialect`.
//! Role: Small `Copy` config passed by value into the splitter.
//! Invariants: Delimiter and quote are distinct, non-terminator characters (see `validate`).
use crate::core::error::{Error, ErrorKind};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Dialect {
    pub delimiter: char,
    pub quote: char,
    /// Fail on an unterminated quoted field instead of flushing it at end of input.
    pub strict: bool,
    /// Trim surrounding whitespace from unquoted fields.
    pub trim: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            strict: false,
            trim: false,
        }
    }
}

impl Dialect {
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.delimiter == self.quote {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("delimiter and quote must differ")
                .with_hint("Pick a quote character that never separates fields."));
        }
        for (name, ch) in [("delimiter", self.delimiter), ("quote", self.quote)] {
            if ch == '\n' || ch == '\r' {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(format!("{name} cannot be a line terminator")));
            }
        }
        Ok(())
    }
}
