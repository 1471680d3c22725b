//! View result parsing
//!
//! [`ViewResultParser`] is a state machine over the wire shape
//! `{ total_rows?, offset?, update_seq?, rows: [ row* ] }`. It reads the
//! response token-by-token through the [`crate::framer`], so large views
//! are never buffered whole: one row is materialized at a time.
//!
//! Rows come in four shapes, and the shape is detected once from the
//! first row, then reused for the rest of the result set:
//! - plain rows decode the caller's target from `value`;
//! - value-is-document rows (the map function emitted the document as
//!   its value) also decode from `value`, recognized by the `_id` field;
//! - included-document rows decode from `doc` and ignore `value`;
//! - error rows fail with the offending key, unless the query asked to
//!   skip `not_found` rows.
//!
//! Header fields may trail the `rows` array on some payload variants, so
//! the parser keeps reading fields after the array closes.

use crate::framer::JsonFramer;
use crate::row::{UpdateSeq, ViewResult, ViewRow};
use futon_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::io::BufRead;
use std::marker::PhantomData;

/// Row shape of a result set, detected once from the first row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// The caller's target type is decoded from `value`
    Plain,
    /// `value` itself is the document emitted by the map function
    ValueIsDoc,
    /// The target is decoded from the separate `doc` field
    IncludedDoc,
}

#[derive(Deserialize)]
struct RawRow {
    id: Option<String>,
    #[serde(default)]
    key: Value,
    #[serde(default)]
    value: Value,
    doc: Option<Value>,
    error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    InRows,
    Done,
}

/// Incremental parser yielding typed rows plus header metadata
pub struct ViewResultParser<R: BufRead, T> {
    framer: JsonFramer<R>,
    state: State,
    shape: Option<RowShape>,
    total_rows: Option<u64>,
    offset: Option<u64>,
    update_seq: Option<UpdateSeq>,
    first: Option<(Option<String>, Value)>,
    last: Option<(Option<String>, Value)>,
    ignore_not_found: bool,
    _target: PhantomData<fn() -> T>,
}

impl<R: BufRead, T: DeserializeOwned> ViewResultParser<R, T> {
    /// Parser over a response body
    pub fn new(reader: R, ignore_not_found: bool) -> Self {
        Self {
            framer: JsonFramer::new(reader),
            state: State::Start,
            shape: None,
            total_rows: None,
            offset: None,
            update_seq: None,
            first: None,
            last: None,
            ignore_not_found,
            _target: PhantomData,
        }
    }

    /// Read leading header fields, stopping at the start of `rows`
    ///
    /// Idempotent; [`next_row`](Self::next_row) calls it on demand. A
    /// top-level `error` field fails here with a document access error,
    /// which is distinct from a per-row error.
    pub fn read_header(&mut self) -> Result<()> {
        if self.state != State::Start {
            return Ok(());
        }
        self.framer.expect(b'{')?;
        loop {
            if self.framer.consume_if(b'}')? {
                self.state = State::Done;
                return Ok(());
            }
            let name = self.framer.parse_string()?;
            self.framer.expect(b':')?;
            if name == "rows" {
                self.framer.expect(b'[')?;
                self.state = State::InRows;
                return Ok(());
            }
            self.store_header_field(&name)?;
            if !self.framer.consume_if(b',')? {
                self.framer.expect(b'}')?;
                self.state = State::Done;
                return Ok(());
            }
        }
    }

    /// Parse the next row, or `None` once the result set is exhausted
    ///
    /// After the error of a malformed payload or a raised row error the
    /// parser is fused: further calls return `None`.
    pub fn next_row(&mut self) -> Result<Option<ViewRow<T>>> {
        match self.advance() {
            Err(e) => {
                self.state = State::Done;
                Err(e)
            }
            ok => ok,
        }
    }

    fn advance(&mut self) -> Result<Option<ViewRow<T>>> {
        loop {
            match self.state {
                State::Start => self.read_header()?,
                State::Done => return Ok(None),
                State::InRows => {
                    // An announced-empty result needs no row parsing.
                    if self.total_rows == Some(0) {
                        self.state = State::Done;
                        return Ok(None);
                    }
                    if self.framer.consume_if(b']')? {
                        self.read_trailer()?;
                        self.state = State::Done;
                        return Ok(None);
                    }
                    let bytes = self.framer.capture_value()?;
                    self.framer.consume_if(b',')?;
                    let raw: RawRow = serde_json::from_slice(&bytes).map_err(|e| {
                        Error::DocumentAccess(format!("malformed view row: {e}"))
                    })?;

                    if let Some(error) = raw.error {
                        if self.ignore_not_found && error == "not_found" {
                            tracing::debug!(
                                target: "futon::parser",
                                key = %raw.key,
                                "skipping not_found row"
                            );
                            continue;
                        }
                        return Err(Error::Row {
                            key: raw.key,
                            message: error,
                        });
                    }

                    let shape = match self.shape {
                        Some(shape) => shape,
                        None => {
                            let detected = detect_shape(&raw);
                            tracing::debug!(
                                target: "futon::parser",
                                shape = ?detected,
                                "detected row shape"
                            );
                            self.shape = Some(detected);
                            detected
                        }
                    };
                    let row = decode_row(raw, shape)?;

                    if self.first.is_none() {
                        self.first = Some((row.id.clone(), row.key.clone()));
                    }
                    self.last = Some((row.id.clone(), row.key.clone()));
                    return Ok(Some(row));
                }
            }
        }
    }

    /// Header fields placed after the rows array
    fn read_trailer(&mut self) -> Result<()> {
        loop {
            if self.framer.consume_if(b'}')? {
                return Ok(());
            }
            self.framer.consume_if(b',')?;
            let name = self.framer.parse_string()?;
            self.framer.expect(b':')?;
            self.store_header_field(&name)?;
        }
    }

    fn store_header_field(&mut self, name: &str) -> Result<()> {
        match name {
            "total_rows" => self.total_rows = Some(self.parse_u64()?),
            "offset" => self.offset = Some(self.parse_u64()?),
            "update_seq" => {
                let value = self.parse_value()?;
                self.update_seq = Some(UpdateSeq::from_value(&value));
            }
            "error" => return Err(self.top_level_error()?),
            _ => {
                let _ = self.framer.capture_value()?;
            }
        }
        Ok(())
    }

    /// A top-level `error` field; collect the trailing `reason` if present
    fn top_level_error(&mut self) -> Result<Error> {
        let error: String = serde_json::from_slice(&self.framer.capture_value()?)
            .map_err(|e| Error::DocumentAccess(format!("malformed error field: {e}")))?;
        let mut reason = None;
        if self.framer.consume_if(b',')? {
            let name = self.framer.parse_string()?;
            self.framer.expect(b':')?;
            let value = self.parse_value()?;
            if name == "reason" {
                reason = value.as_str().map(str::to_string);
            }
        }
        Ok(Error::DocumentAccess(match reason {
            Some(reason) => format!("view request failed: {error}: {reason}"),
            None => format!("view request failed: {error}"),
        }))
    }

    fn parse_u64(&mut self) -> Result<u64> {
        let bytes = self.framer.capture_value()?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::DocumentAccess(format!("malformed numeric header field: {e}")))
    }

    fn parse_value(&mut self) -> Result<Value> {
        let bytes = self.framer.capture_value()?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::DocumentAccess(format!("malformed header field: {e}")))
    }

    // ========== Metadata accessors ==========

    /// Total row count, when the server reported one
    pub fn total_rows(&self) -> Option<u64> {
        self.total_rows
    }

    /// Offset of the first row within the full view
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Index update sequence, when present
    pub fn update_seq(&self) -> Option<&UpdateSeq> {
        self.update_seq.as_ref()
    }

    /// Detected row shape; `None` before the first row
    pub fn shape(&self) -> Option<RowShape> {
        self.shape
    }

    /// Id/key pair of the first parsed row
    pub fn first_pair(&self) -> Option<&(Option<String>, Value)> {
        self.first.as_ref()
    }

    /// Id/key pair of the most recently parsed row
    pub fn last_pair(&self) -> Option<&(Option<String>, Value)> {
        self.last.as_ref()
    }
}

fn detect_shape(raw: &RawRow) -> RowShape {
    if raw.doc.is_some() {
        RowShape::IncludedDoc
    } else if raw
        .value
        .as_object()
        .map_or(false, |o| o.contains_key("_id"))
    {
        RowShape::ValueIsDoc
    } else {
        RowShape::Plain
    }
}

fn decode_row<T: DeserializeOwned>(raw: RawRow, shape: RowShape) -> Result<ViewRow<T>> {
    let item = match shape {
        RowShape::IncludedDoc => {
            let doc = raw.doc.unwrap_or(Value::Null);
            serde_json::from_value(doc)
                .map_err(|e| Error::DocumentAccess(format!("failed to decode row document: {e}")))?
        }
        RowShape::Plain | RowShape::ValueIsDoc => serde_json::from_value(raw.value.clone())
            .map_err(|e| Error::DocumentAccess(format!("failed to decode row value: {e}")))?,
    };
    Ok(ViewRow {
        id: raw.id,
        key: raw.key,
        value: raw.value,
        item,
    })
}

/// Buffered parse: drive the incremental parser to exhaustion
pub fn parse_view_result<T, R>(reader: R, ignore_not_found: bool) -> Result<ViewResult<T>>
where
    T: DeserializeOwned,
    R: BufRead,
{
    let mut parser = ViewResultParser::new(reader, ignore_not_found);
    parser.read_header()?;
    let mut rows = Vec::new();
    while let Some(row) = parser.next_row()? {
        rows.push(row);
    }
    Ok(ViewResult::new(
        rows,
        parser.total_rows,
        parser.offset,
        parser.update_seq,
        parser.first,
        parser.last,
    ))
}
