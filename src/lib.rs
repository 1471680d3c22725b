//! futon - client library for CouchDB-style map/reduce views
//!
//! futon builds view queries, executes them over a pluggable HTTP
//! transport, parses result rows incrementally, and pages through large
//! result sets with opaque, reversible cursors.
//!
//! # Quick Start
//!
//! ```ignore
//! use futon::{HttpTransport, PageRequest, TransportConfig, ViewClient, ViewQuery};
//!
//! let transport = HttpTransport::new(TransportConfig::default());
//! let client = ViewClient::new(Box::new(transport), "orders");
//!
//! let query = ViewQuery::new()
//!     .design_doc_id("reports")
//!     .view_name("by_customer")
//!     .include_docs(true);
//!
//! // First page of ten rows; the page carries the cursor for the next one.
//! let page = client.query_page::<serde_json::Value>(&query, &PageRequest::first_page(10))?;
//! if page.has_next() {
//!     let token = page.next_link()?; // opaque base64url token
//! }
//! ```
//!
//! # Architecture
//!
//! The public API lives in `futon-client` (query builder, transport,
//! result parsing, pagination) over the value types in `futon-core`
//! (keys, cursors, errors). Both are re-exported here.

pub use futon_client::*;
pub use futon_core::{ComplexKey, Error, KeyComponent, PageRequest, Result, ResumeKey};
