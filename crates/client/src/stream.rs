//! Streaming view results
//!
//! [`StreamingViewResult`] wraps the incremental parser for callers that
//! must not buffer a large view. Header metadata (total, offset, update
//! sequence) is available before the first row is requested; rows come
//! from a forward-only, single-pass iterator.
//!
//! The iterator contract is strict: [`StreamingViewResult::rows`] may be
//! called exactly once, from one logical task, and iterating again is a
//! programming error that panics immediately instead of silently
//! yielding nothing. The underlying response body is released exactly
//! once - on drop, on [`close`](StreamingViewResult::close), or eagerly
//! on [`abort`](StreamingViewResult::abort). Abort is for giving up
//! mid-stream: it discards the in-flight body instead of assuming the
//! remaining rows will be drained.

use crate::parser::{RowShape, ViewResultParser};
use crate::row::{UpdateSeq, ViewRow};
use futon_core::Result;
use serde::de::DeserializeOwned;
use std::io::BufRead;

/// Single-pass streaming view result
pub struct StreamingViewResult<T: DeserializeOwned, R: BufRead> {
    parser: Option<ViewResultParser<R, T>>,
    iterated: bool,
}

impl<T: DeserializeOwned, R: BufRead> StreamingViewResult<T, R> {
    /// Open a streaming result, reading header fields eagerly
    ///
    /// Metadata placed *after* the rows array only becomes visible once
    /// the iterator is exhausted.
    pub fn new(reader: R, ignore_not_found: bool) -> Result<Self> {
        let mut parser = ViewResultParser::new(reader, ignore_not_found);
        parser.read_header()?;
        Ok(Self {
            parser: Some(parser),
            iterated: false,
        })
    }

    /// Total row count, when already reported
    pub fn total_rows(&self) -> Option<u64> {
        self.parser.as_ref().and_then(ViewResultParser::total_rows)
    }

    /// Offset of the first row, when already reported
    pub fn offset(&self) -> Option<u64> {
        self.parser.as_ref().and_then(ViewResultParser::offset)
    }

    /// Index update sequence, when already reported
    pub fn update_seq(&self) -> Option<&UpdateSeq> {
        self.parser.as_ref().and_then(ViewResultParser::update_seq)
    }

    /// Row shape, once the first row has been parsed
    pub fn shape(&self) -> Option<RowShape> {
        self.parser.as_ref().and_then(ViewResultParser::shape)
    }

    /// Id/key pair of the most recently yielded row
    pub fn last_pair(&self) -> Option<&(Option<String>, serde_json::Value)> {
        self.parser.as_ref().and_then(ViewResultParser::last_pair)
    }

    /// The forward-only row iterator
    ///
    /// # Panics
    ///
    /// Panics when called a second time, or after [`abort`](Self::abort):
    /// the stream is single-pass and misuse is reported immediately.
    pub fn rows(&mut self) -> Rows<'_, T, R> {
        if self.iterated {
            panic!("StreamingViewResult::rows may only be called once; the stream is single-pass");
        }
        let parser = match self.parser.as_mut() {
            Some(parser) => parser,
            None => panic!("StreamingViewResult::rows called after abort"),
        };
        self.iterated = true;
        Rows { parser }
    }

    /// Release the response body, assuming the stream is drained or drainable
    pub fn close(self) {}

    /// Interrupt an in-flight read and release the response body now
    pub fn abort(&mut self) {
        self.parser = None;
    }
}

/// Iterator over streamed rows
///
/// Fused after the first error: a malformed payload or raised row error
/// ends the stream.
pub struct Rows<'a, T: DeserializeOwned, R: BufRead> {
    parser: &'a mut ViewResultParser<R, T>,
}

impl<T: DeserializeOwned, R: BufRead> Iterator for Rows<'_, T, R> {
    type Item = Result<ViewRow<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.parser.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
