//! Pagination cursors and opaque resume tokens
//!
//! A [`PageRequest`] captures "where the next page starts" plus a history
//! stack of previously visited resume points, so a stateless HTTP API can
//! be paged forward *and* backward. Cursors are immutable values: moving
//! produces a new cursor and never touches the old one, which makes them
//! freely shareable across threads.
//!
//! ## Token format
//!
//! A cursor serializes to canonical compact JSON
//! `{"s": pageSize, "k": {docId: key}?, "h": [{docId: key}, ...]}` and is
//! then base64url-encoded into the opaque token handed to callers (for
//! example inside a "next page" link). The history array is stored
//! oldest-first on the wire and used as a stack in memory. A distinguished
//! sentinel entry, serialized as `{}`, marks "this is page one" - distinct
//! from "no history", which is how backward navigation can tell the first
//! page apart from a cursor that never moved.
//!
//! ## Equality
//!
//! Cursor equality compares page size, resume key, and history *length*,
//! not history content. This looseness is deliberate and part of the
//! contract; callers use it for cheap page deduplication.

use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

/// Resume point: the key/doc-id pair a page starts at
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeKey {
    /// View key of the first row of the page
    pub key: Value,
    /// Document id tie-breaker for duplicate keys
    pub doc_id: String,
}

impl ResumeKey {
    /// Create a resume key
    pub fn new(key: Value, doc_id: impl Into<String>) -> Self {
        Self {
            key,
            doc_id: doc_id.into(),
        }
    }

    fn to_json(&self) -> Value {
        let mut entry = Map::with_capacity(1);
        entry.insert(self.doc_id.clone(), self.key.clone());
        Value::Object(entry)
    }

    fn from_json(value: &Value) -> Result<Self> {
        let entry = value
            .as_object()
            .filter(|o| o.len() == 1)
            .ok_or_else(|| Error::InvalidFormat("resume entry is not {docId: key}".to_string()))?;
        let (doc_id, key) = entry
            .iter()
            .next()
            .ok_or_else(|| Error::InvalidFormat("resume entry is empty".to_string()))?;
        Ok(Self::new(key.clone(), doc_id.clone()))
    }
}

/// History stack entry; `FirstPage` is the page-one sentinel
#[derive(Debug, Clone, PartialEq)]
enum HistoryEntry {
    FirstPage,
    Resume(ResumeKey),
}

impl HistoryEntry {
    fn to_json(&self) -> Value {
        match self {
            // The sentinel rides the wire as an empty object; a real
            // entry always carries exactly one doc id.
            HistoryEntry::FirstPage => Value::Object(Map::new()),
            HistoryEntry::Resume(resume) => resume.to_json(),
        }
    }

    fn from_json(value: &Value) -> Result<Self> {
        match value.as_object() {
            Some(o) if o.is_empty() => Ok(HistoryEntry::FirstPage),
            Some(_) => Ok(HistoryEntry::Resume(ResumeKey::from_json(value)?)),
            None => Err(Error::InvalidFormat(
                "history entry is not an object".to_string(),
            )),
        }
    }
}

/// Immutable pagination cursor
///
/// The history stack length equals the number of pages already advanced
/// past; `history` is oldest-first, pushed and popped from the end.
#[derive(Debug, Clone)]
pub struct PageRequest {
    page_size: usize,
    resume_key: Option<ResumeKey>,
    history: Vec<HistoryEntry>,
}

impl PartialEq for PageRequest {
    /// Loose by contract: history is compared by length only
    fn eq(&self, other: &Self) -> bool {
        self.page_size == other.page_size
            && self.resume_key == other.resume_key
            && self.history.len() == other.history.len()
    }
}

impl PageRequest {
    /// Cursor for the first page: no resume key, empty history
    pub fn first_page(page_size: usize) -> Self {
        Self {
            page_size,
            resume_key: None,
            history: Vec::new(),
        }
    }

    /// Rows per page
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Resume point, absent on the first page
    pub fn resume_key(&self) -> Option<&ResumeKey> {
        self.resume_key.as_ref()
    }

    /// One-based page number (history length + 1)
    pub fn page_number(&self) -> usize {
        self.history.len() + 1
    }

    /// True when a previous page exists
    pub fn has_previous(&self) -> bool {
        !self.history.is_empty()
    }

    /// Cursor for the next page, resuming at `(key, doc_id)`
    ///
    /// Pushes the current resume point onto history; on page one the
    /// sentinel is pushed instead, so "came from page one" stays
    /// distinguishable from "no history".
    pub fn advance(&self, key: Value, doc_id: impl Into<String>) -> Self {
        let mut history = self.history.clone();
        history.push(match &self.resume_key {
            None => HistoryEntry::FirstPage,
            Some(resume) => HistoryEntry::Resume(resume.clone()),
        });
        Self {
            page_size: self.page_size,
            resume_key: Some(ResumeKey::new(key, doc_id)),
            history,
        }
    }

    /// Cursor for the previous page, or `None` when already on page one
    pub fn retreat(&self) -> Option<Self> {
        let mut history = self.history.clone();
        match history.pop()? {
            HistoryEntry::FirstPage => Some(Self::first_page(self.page_size)),
            HistoryEntry::Resume(resume) => Some(Self {
                page_size: self.page_size,
                resume_key: Some(resume),
                history,
            }),
        }
    }

    /// Serialize to the opaque URL-safe token
    pub fn to_token(&self) -> String {
        let mut doc = Map::new();
        doc.insert("s".to_string(), Value::from(self.page_size as u64));
        if let Some(resume) = &self.resume_key {
            doc.insert("k".to_string(), resume.to_json());
        }
        doc.insert(
            "h".to_string(),
            Value::Array(self.history.iter().map(HistoryEntry::to_json).collect()),
        );
        URL_SAFE_NO_PAD.encode(Value::Object(doc).to_string())
    }

    /// Decode a token produced by [`to_token`](Self::to_token)
    ///
    /// A corrupt token fails with [`Error::InvalidFormat`]; there is no
    /// partial or best-effort decode.
    pub fn from_token(token: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| Error::InvalidFormat(format!("page token is not base64url: {e}")))?;
        let doc: Value = serde_json::from_slice(&bytes)
            .map_err(|e| Error::InvalidFormat(format!("page token is not JSON: {e}")))?;

        let page_size = doc
            .get("s")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::InvalidFormat("page token missing page size".to_string()))?
            as usize;
        let resume_key = match doc.get("k") {
            None | Some(Value::Null) => None,
            Some(entry) => Some(ResumeKey::from_json(entry)?),
        };
        let history = match doc.get("h") {
            None => Vec::new(),
            Some(Value::Array(entries)) => entries
                .iter()
                .map(HistoryEntry::from_json)
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(Error::InvalidFormat(
                    "page token history is not an array".to_string(),
                ))
            }
        };

        Ok(Self {
            page_size,
            resume_key,
            history,
        })
    }
}
