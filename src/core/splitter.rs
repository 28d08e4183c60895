//! Purpose: Split a delimited-text stream into rows of raw string fields.
//! Exports: `Row`, `RowSplitter`, `split_str`.
//! Role: Tokenizer under the row processor; knows quoting, knows nothing of schemas.
//! Invariants: Single forward pass; a row is emitted only once its terminator (or EOF) is seen.
//! Invariants: Delimiters and line terminators inside quoted fields are literal content.
//! Invariants: Entirely empty lines never produce a row.
//! Notes: Input is consumed one physical line at a time, so buffering is bounded by
//! the longest line plus the row currently being assembled.
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::mem;

use bstr::ByteSlice;

use crate::core::dialect::Dialect;
use crate::core::error::{Error, ErrorKind};

pub type Row = Vec<String>;

const BOM: char = '\u{feff}';

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    // A quote was seen inside a quoted field: either an escape or the closing quote.
    QuoteInQuoted,
}

pub struct RowSplitter<R: Read> {
    reader: BufReader<R>,
    dialect: Dialect,
    buf: Vec<u8>,
    state: State,
    field: String,
    // Length of `field` at the point its closing quote was seen; trimming never reaches below it.
    quoted_end: usize,
    row: Row,
    // A character was seen since the last terminator; untouched rows are dropped.
    touched: bool,
    // Swallow the `\n` of a CRLF pair after `\r` already ended the row.
    skip_lf: bool,
    line_no: u64,
    // Line where the row being assembled started.
    row_line: u64,
    quote_line: u64,
    // Start line of the row most recently handed out by `next`.
    last_line: u64,
    pending: VecDeque<(Row, u64)>,
    done: bool,
}

impl<R: Read> RowSplitter<R> {
    pub fn new(reader: R, dialect: Dialect) -> Result<Self, Error> {
        dialect.validate()?;
        Ok(Self {
            reader: BufReader::new(reader),
            dialect,
            buf: Vec::new(),
            state: State::FieldStart,
            field: String::new(),
            quoted_end: 0,
            row: Vec::new(),
            touched: false,
            skip_lf: false,
            line_no: 0,
            row_line: 0,
            quote_line: 0,
            last_line: 0,
            pending: VecDeque::new(),
            done: false,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// One-based physical line on which the most recently yielded row started.
    pub fn row_line(&self) -> u64 {
        self.last_line
    }

    fn fill(&mut self) -> Result<(), Error> {
        let mut buf = mem::take(&mut self.buf);
        buf.clear();
        let result = match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => self.finish(),
            Ok(_) => self.consume_line(&buf),
            Err(err) => Err(Error::new(ErrorKind::SourceUnavailable)
                .with_message("failed to read input")
                .with_line(self.line_no + 1)
                .with_source(err)),
        };
        self.buf = buf;
        result
    }

    fn consume_line(&mut self, raw: &[u8]) -> Result<(), Error> {
        self.line_no += 1;
        let mut text = raw.to_str().map_err(|err| {
            Error::new(ErrorKind::Encoding)
                .with_message("input is not valid UTF-8")
                .with_line(self.line_no)
                .with_source(err)
        })?;
        if self.line_no == 1 {
            text = text.strip_prefix(BOM).unwrap_or(text);
        }
        for ch in text.chars() {
            self.feed(ch);
        }
        Ok(())
    }

    fn feed(&mut self, ch: char) {
        if mem::take(&mut self.skip_lf) && ch == '\n' {
            return;
        }
        match self.state {
            State::FieldStart | State::Unquoted => self.feed_outside(ch),
            State::Quoted => {
                if ch == self.dialect.quote {
                    self.state = State::QuoteInQuoted;
                } else {
                    self.field.push(ch);
                }
            }
            State::QuoteInQuoted => {
                if ch == self.dialect.quote {
                    self.field.push(ch);
                    self.state = State::Quoted;
                } else {
                    self.quoted_end = self.field.len();
                    self.state = State::Unquoted;
                    self.feed_outside(ch);
                }
            }
        }
    }

    fn feed_outside(&mut self, ch: char) {
        if ch == '\n' || ch == '\r' {
            self.skip_lf = ch == '\r';
            self.end_row();
            return;
        }
        self.touch();
        if ch == self.dialect.delimiter {
            self.end_field();
        } else if self.state == State::FieldStart && ch == self.dialect.quote {
            self.quote_line = self.line_no;
            self.state = State::Quoted;
        } else if self.state == State::FieldStart && self.dialect.trim && ch.is_whitespace() {
            // leading whitespace before the field proper
        } else {
            self.field.push(ch);
            self.state = State::Unquoted;
        }
    }

    fn touch(&mut self) {
        if !self.touched {
            self.touched = true;
            self.row_line = self.line_no;
        }
    }

    fn end_field(&mut self) {
        let mut field = mem::take(&mut self.field);
        if self.dialect.trim {
            let keep = self.quoted_end + field[self.quoted_end..].trim_end().len();
            field.truncate(keep);
        }
        self.row.push(field);
        self.quoted_end = 0;
        self.state = State::FieldStart;
    }

    fn end_row(&mut self) {
        if !self.touched {
            self.state = State::FieldStart;
            return;
        }
        self.end_field();
        let row = mem::take(&mut self.row);
        self.pending.push_back((row, self.row_line));
        self.touched = false;
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.done = true;
        match self.state {
            State::Quoted if self.dialect.strict => {
                return Err(Error::new(ErrorKind::MalformedQuoting)
                    .with_message("unterminated quoted field at end of input")
                    .with_line(self.quote_line)
                    .with_hint("Close the quoted field or disable strict mode."));
            }
            State::Quoted | State::QuoteInQuoted => {
                self.quoted_end = self.field.len();
            }
            State::FieldStart | State::Unquoted => {}
        }
        self.end_row();
        Ok(())
    }
}

impl<R: Read> Iterator for RowSplitter<R> {
    type Item = Result<Row, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((row, line)) = self.pending.pop_front() {
                self.last_line = line;
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            if let Err(err) = self.fill() {
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}

/// Split an in-memory string into rows.
pub fn split_str(input: &str, dialect: Dialect) -> Result<Vec<Row>, Error> {
    RowSplitter::new(input.as_bytes(), dialect)?.collect()
}
