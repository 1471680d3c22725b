//! Composite view keys and their JSON encoding
//!
//! View servers collate JSON keys as: null < false < true < numbers <
//! strings < arrays < objects, with arrays and objects compared
//! element- and key-wise. Range scans over composite keys exploit that
//! order: because `{}` sorts after every scalar, string, and array, the
//! bounds `["a","b"]` .. `["a","b",{}]` enclose exactly the rows whose
//! key starts with `["a","b"]`.
//!
//! Two sentinel components exist solely to build such collation-exact
//! bounds: [`KeyComponent::EmptyObject`] always renders `{}` and
//! [`KeyComponent::EmptyArray`] always renders `[]`, regardless of
//! surrounding context.
//!
//! A key is either *typed* (components encoded here) or *raw*
//! (pre-encoded JSON text passed through verbatim) - never both. The
//! closed [`KeyComponent`] enum makes that distinction explicit instead
//! of relying on sentinel object identity.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;

/// One component of a composite view key
#[derive(Debug, Clone, PartialEq)]
pub enum KeyComponent {
    /// Any JSON-encodable scalar or container, rendered with its
    /// natural JSON encoding
    Scalar(Value),
    /// Collation sentinel, renders `{}` (sorts after everything else)
    EmptyObject,
    /// Collation sentinel, renders `[]` (sorts after scalars and strings)
    EmptyArray,
    /// Pre-encoded JSON text, passed through verbatim
    Raw(String),
}

impl KeyComponent {
    fn write_json(&self, out: &mut String) {
        match self {
            KeyComponent::Scalar(value) => out.push_str(&value.to_string()),
            KeyComponent::EmptyObject => out.push_str("{}"),
            KeyComponent::EmptyArray => out.push_str("[]"),
            KeyComponent::Raw(text) => out.push_str(text),
        }
    }
}

impl From<&str> for KeyComponent {
    fn from(s: &str) -> Self {
        KeyComponent::Scalar(Value::String(s.to_string()))
    }
}

impl From<String> for KeyComponent {
    fn from(s: String) -> Self {
        KeyComponent::Scalar(Value::String(s))
    }
}

impl From<i64> for KeyComponent {
    fn from(n: i64) -> Self {
        KeyComponent::Scalar(Value::from(n))
    }
}

impl From<u64> for KeyComponent {
    fn from(n: u64) -> Self {
        KeyComponent::Scalar(Value::from(n))
    }
}

impl From<i32> for KeyComponent {
    fn from(n: i32) -> Self {
        KeyComponent::Scalar(Value::from(n))
    }
}

impl From<f64> for KeyComponent {
    fn from(n: f64) -> Self {
        KeyComponent::Scalar(Value::from(n))
    }
}

impl From<bool> for KeyComponent {
    fn from(b: bool) -> Self {
        KeyComponent::Scalar(Value::Bool(b))
    }
}

impl From<Value> for KeyComponent {
    fn from(value: Value) -> Self {
        KeyComponent::Scalar(value)
    }
}

/// Nested composites keep their sentinel/raw components by re-encoding
impl From<ComplexKey> for KeyComponent {
    fn from(key: ComplexKey) -> Self {
        KeyComponent::Raw(key.encode())
    }
}

impl From<DateTime<Utc>> for KeyComponent {
    fn from(dt: DateTime<Utc>) -> Self {
        KeyComponent::Scalar(Value::String(
            dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        ))
    }
}

impl From<NaiveDate> for KeyComponent {
    fn from(date: NaiveDate) -> Self {
        KeyComponent::Scalar(Value::String(date.format("%Y-%m-%d").to_string()))
    }
}

/// Ordered composite key, rendered as a JSON array
///
/// # Example
///
/// ```
/// use futon_core::{ComplexKey, KeyComponent};
///
/// let key = ComplexKey::new().add("foo").add(KeyComponent::EmptyObject);
/// assert_eq!(key.encode(), r#"["foo",{}]"#);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComplexKey {
    components: Vec<KeyComponent>,
}

impl ComplexKey {
    /// Create an empty composite key
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a composite key from an ordered sequence of components
    pub fn of<I>(components: I) -> Self
    where
        I: IntoIterator<Item = KeyComponent>,
    {
        Self {
            components: components.into_iter().collect(),
        }
    }

    /// Append a component
    pub fn add(mut self, component: impl Into<KeyComponent>) -> Self {
        self.components.push(component.into());
        self
    }

    /// Append the `{}` collation sentinel
    pub fn empty_object(self) -> Self {
        self.add(KeyComponent::EmptyObject)
    }

    /// Append the `[]` collation sentinel
    pub fn empty_array(self) -> Self {
        self.add(KeyComponent::EmptyArray)
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True when the key has no components
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components in order
    pub fn components(&self) -> &[KeyComponent] {
        &self.components
    }

    /// Render the key as JSON array text
    pub fn encode(&self) -> String {
        let mut out = String::from("[");
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            component.write_json(&mut out);
        }
        out.push(']');
        out
    }

    /// Parse previously encoded key text back into a JSON value tree
    ///
    /// Also accepts raw keys the caller set verbatim. Malformed input
    /// is an [`Error::InvalidFormat`]; there is no recovery.
    pub fn decode(text: &str) -> Result<Value> {
        serde_json::from_str(text)
            .map_err(|e| Error::InvalidFormat(format!("malformed key JSON: {e}")))
    }
}
