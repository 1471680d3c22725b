//! Result rows and header metadata

use serde_json::Value;

/// One view result row
///
/// `item` is the decoded caller target: taken from `value` for plain and
/// value-is-document rows, and from the embedded `doc` when the query
/// asked for included documents.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow<T> {
    /// Document id; absent for pure-reduce rows
    pub id: Option<String>,
    /// Row key, kept as opaque JSON
    pub key: Value,
    /// Raw emitted value, kept as opaque JSON
    pub value: Value,
    /// Decoded target
    pub item: T,
}

/// Index update sequence: a number on older servers, opaque text elsewhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateSeq {
    /// Numeric sequence
    Number(u64),
    /// Opaque sequence token
    Text(String),
}

impl UpdateSeq {
    pub(crate) fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => UpdateSeq::Text(s.clone()),
            other => match other.as_u64() {
                Some(n) => UpdateSeq::Number(n),
                None => UpdateSeq::Text(other.to_string()),
            },
        }
    }
}

/// Fully parsed view result: rows plus header metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ViewResult<T> {
    rows: Vec<ViewRow<T>>,
    total_rows: Option<u64>,
    offset: Option<u64>,
    update_seq: Option<UpdateSeq>,
    first: Option<(Option<String>, Value)>,
    last: Option<(Option<String>, Value)>,
}

impl<T> ViewResult<T> {
    pub(crate) fn new(
        rows: Vec<ViewRow<T>>,
        total_rows: Option<u64>,
        offset: Option<u64>,
        update_seq: Option<UpdateSeq>,
        first: Option<(Option<String>, Value)>,
        last: Option<(Option<String>, Value)>,
    ) -> Self {
        Self {
            rows,
            total_rows,
            offset,
            update_seq,
            first,
            last,
        }
    }

    /// Parsed rows in server order
    pub fn rows(&self) -> &[ViewRow<T>] {
        &self.rows
    }

    /// Consume the result, keeping the rows
    pub fn into_rows(self) -> Vec<ViewRow<T>> {
        self.rows
    }

    /// Number of parsed rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no rows were parsed
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total row count; absent for streamed/partial results and
    /// meaningless for reduced views
    pub fn total_rows(&self) -> Option<u64> {
        self.total_rows
    }

    /// Offset of the first row within the full view
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Index update sequence, when requested
    pub fn update_seq(&self) -> Option<&UpdateSeq> {
        self.update_seq.as_ref()
    }

    /// Document id of the first parsed row
    pub fn first_id(&self) -> Option<&str> {
        self.first.as_ref().and_then(|(id, _)| id.as_deref())
    }

    /// Key of the first parsed row
    pub fn first_key(&self) -> Option<&Value> {
        self.first.as_ref().map(|(_, key)| key)
    }

    /// Document id of the last parsed row
    pub fn last_id(&self) -> Option<&str> {
        self.last.as_ref().and_then(|(id, _)| id.as_deref())
    }

    /// Key of the last parsed row
    pub fn last_key(&self) -> Option<&Value> {
        self.last.as_ref().map(|(_, key)| key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_seq_number() {
        assert_eq!(UpdateSeq::from_value(&json!(17)), UpdateSeq::Number(17));
    }

    #[test]
    fn test_update_seq_opaque_text() {
        assert_eq!(
            UpdateSeq::from_value(&json!("23-g1AAAA")),
            UpdateSeq::Text("23-g1AAAA".to_string())
        );
    }

    #[test]
    fn test_update_seq_other_json_kept_as_text() {
        assert_eq!(
            UpdateSeq::from_value(&json!({"seq": 1})),
            UpdateSeq::Text("{\"seq\":1}".to_string())
        );
    }
}
