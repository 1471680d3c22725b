//! View query and cursor pagination client
//!
//! This crate implements the query side of a CouchDB-style view API:
//! - ViewQuery: fluent, deterministic view request builder
//! - DispatchStrategy: URL-versus-body dispatch for multi-key queries
//! - Transport / HttpTransport: pluggable HTTP seam with a ureq default
//! - ViewResultParser / StreamingViewResult: incremental row parsing
//! - Page / PageRequest: cursor pagination with opaque resume tokens
//! - ViewClient: stateless façade wiring the pieces together

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod dispatch;
mod framer;
pub mod page;
pub mod parser;
pub mod query;
pub mod row;
pub mod stream;
pub mod transport;

pub use client::ViewClient;
pub use dispatch::{DispatchStrategy, KeyDispatch, LengthThresholdDispatch, KEYS_URL_LENGTH_LIMIT};
pub use page::Page;
pub use parser::{parse_view_result, RowShape, ViewResultParser};
pub use query::{Key, StaleMode, ViewQuery, ALL_DOCS_VIEW};
pub use row::{UpdateSeq, ViewResult, ViewRow};
pub use stream::{Rows, StreamingViewResult};
pub use transport::{
    HttpTransport, Method, Transport, TransportConfig, TransportResponse, ViewRequest,
};

pub use futon_core::{ComplexKey, Error, KeyComponent, PageRequest, Result, ResumeKey};
