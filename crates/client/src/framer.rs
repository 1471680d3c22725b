//! Incremental JSON framing over a byte stream
//!
//! [`JsonFramer`] splits one complete JSON value at a time off a
//! `BufRead` without building a document tree, tracking only string
//! escapes and bracket depth. The captured bytes are handed to
//! serde_json for actual decoding, so all value semantics stay in one
//! codec; this layer only finds value boundaries.
//!
//! The view response format is irregular (header fields may appear
//! before *or after* the `rows` array), which is why the parser drives
//! this framer field-by-field instead of deserializing the whole object.

use futon_core::{Error, Result};
use std::io::BufRead;

fn eof() -> Error {
    Error::DocumentAccess("unexpected end of view response".to_string())
}

pub(crate) struct JsonFramer<R: BufRead> {
    reader: R,
    peeked: Option<u8>,
}

impl<R: BufRead> JsonFramer<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            peeked: None,
        }
    }

    fn next_raw(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        if let Some(b) = self.peeked.take() {
            return Ok(Some(b));
        }
        self.next_raw()
    }

    fn peek_byte(&mut self) -> Result<Option<u8>> {
        if self.peeked.is_none() {
            self.peeked = self.next_raw()?;
        }
        Ok(self.peeked)
    }

    fn skip_whitespace(&mut self) -> Result<()> {
        while let Some(b) = self.peek_byte()? {
            if b.is_ascii_whitespace() {
                self.peeked = None;
            } else {
                break;
            }
        }
        Ok(())
    }

    /// Consume the next non-whitespace byte, requiring `expected`
    pub(crate) fn expect(&mut self, expected: u8) -> Result<()> {
        self.skip_whitespace()?;
        match self.next_byte()? {
            Some(b) if b == expected => Ok(()),
            Some(b) => Err(Error::DocumentAccess(format!(
                "malformed view response: expected '{}', found '{}'",
                expected as char, b as char
            ))),
            None => Err(eof()),
        }
    }

    /// Consume the next non-whitespace byte if it equals `expected`
    pub(crate) fn consume_if(&mut self, expected: u8) -> Result<bool> {
        self.skip_whitespace()?;
        if self.peek_byte()? == Some(expected) {
            self.peeked = None;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Capture the raw bytes of one complete JSON value
    pub(crate) fn capture_value(&mut self) -> Result<Vec<u8>> {
        self.skip_whitespace()?;
        let mut out = Vec::new();
        match self.peek_byte()? {
            None => Err(eof()),
            Some(b'"') => {
                self.capture_string(&mut out)?;
                Ok(out)
            }
            Some(b'{') | Some(b'[') => {
                let mut depth = 0usize;
                loop {
                    let b = self.next_byte()?.ok_or_else(eof)?;
                    if b == b'"' {
                        self.peeked = Some(b'"');
                        self.capture_string(&mut out)?;
                        continue;
                    }
                    out.push(b);
                    match b {
                        b'{' | b'[' => depth += 1,
                        b'}' | b']' => {
                            depth -= 1;
                            if depth == 0 {
                                return Ok(out);
                            }
                        }
                        _ => {}
                    }
                }
            }
            Some(_) => {
                // Scalar: number, true, false, or null. Runs until a
                // structural delimiter; serde_json validates the content.
                while let Some(b) = self.peek_byte()? {
                    if b == b',' || b == b']' || b == b'}' || b.is_ascii_whitespace() {
                        break;
                    }
                    out.push(b);
                    self.peeked = None;
                }
                if out.is_empty() {
                    Err(Error::DocumentAccess(
                        "malformed view response: empty JSON value".to_string(),
                    ))
                } else {
                    Ok(out)
                }
            }
        }
    }

    fn capture_string(&mut self, out: &mut Vec<u8>) -> Result<()> {
        match self.next_byte()? {
            Some(b'"') => out.push(b'"'),
            Some(b) => {
                return Err(Error::DocumentAccess(format!(
                    "malformed view response: expected string, found '{}'",
                    b as char
                )))
            }
            None => return Err(eof()),
        }
        loop {
            let b = self.next_byte()?.ok_or_else(eof)?;
            out.push(b);
            match b {
                b'\\' => {
                    let escaped = self.next_byte()?.ok_or_else(eof)?;
                    out.push(escaped);
                }
                b'"' => return Ok(()),
                _ => {}
            }
        }
    }

    /// Capture and decode one JSON string (object field names)
    pub(crate) fn parse_string(&mut self) -> Result<String> {
        self.skip_whitespace()?;
        let mut buf = Vec::new();
        self.capture_string(&mut buf)?;
        serde_json::from_slice(&buf)
            .map_err(|e| Error::DocumentAccess(format!("malformed JSON string: {e}")))
    }
}
