//! High-level view client
//!
//! [`ViewClient`] is a stateless façade wiring the transport, query
//! builder, parser, and page assembler together. It holds no state
//! beyond the transport handle, the database name, and the dispatch
//! strategy; queries are cloned per execution, and the clone's database
//! path is rewritten from the client, which is why callers can reuse one
//! base query across databases and pages.

use crate::dispatch::{DispatchStrategy, KeyDispatch, LengthThresholdDispatch};
use crate::page::Page;
use crate::parser::parse_view_result;
use crate::query::{self, ViewQuery};
use crate::row::ViewResult;
use crate::stream::StreamingViewResult;
use crate::transport::{Transport, ViewRequest};
use futon_core::{Error, PageRequest, Result};
use serde::de::DeserializeOwned;
use std::io::{BufReader, Read};

/// How much of an error body is carried into the error message
const ERROR_BODY_LIMIT: u64 = 1024;

/// Stateless view query executor for one database
pub struct ViewClient {
    transport: Box<dyn Transport>,
    database: String,
    dispatch: Box<dyn DispatchStrategy>,
}

impl ViewClient {
    /// Client over a transport, scoped to `database`
    pub fn new(transport: Box<dyn Transport>, database: impl Into<String>) -> Self {
        Self {
            transport,
            database: database.into(),
            dispatch: Box::new(LengthThresholdDispatch::default()),
        }
    }

    /// Replace the multi-key dispatch strategy
    pub fn with_dispatch(mut self, dispatch: Box<dyn DispatchStrategy>) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Database this client executes against
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Execute a query and buffer the parsed result
    pub fn query<T: DeserializeOwned>(&self, query: &ViewQuery) -> Result<ViewResult<T>> {
        let (request, ignore_not_found) = self.build_request(query)?;
        let body = self.execute(&request)?;
        parse_view_result(BufReader::new(body), ignore_not_found)
    }

    /// Execute a query and stream the rows without buffering
    pub fn query_stream<T: DeserializeOwned>(
        &self,
        query: &ViewQuery,
    ) -> Result<StreamingViewResult<T, BufReader<Box<dyn Read + Send>>>> {
        let (request, ignore_not_found) = self.build_request(query)?;
        let body = self.execute(&request)?;
        StreamingViewResult::new(BufReader::new(body), ignore_not_found)
    }

    /// Execute one page of a paginated query
    ///
    /// Injects the cursor's resume bounds and `page size + 1` limit,
    /// then trims the extra row and derives next/previous cursors.
    pub fn query_page<T: DeserializeOwned>(
        &self,
        query: &ViewQuery,
        page: &PageRequest,
    ) -> Result<Page<T>> {
        let paged = query.clone().paginate(page);
        let result = self.query::<T>(&paged)?;
        Ok(Page::assemble(result, page))
    }

    fn build_request(&self, query: &ViewQuery) -> Result<(ViewRequest, bool)> {
        // The db path is rewritten on every execution; the caller's
        // query object is never mutated.
        let mut query = query.clone().db_path(self.database.clone());
        let path = query.path()?;
        let params = query.query_string();

        let request = match query.encoded_keys() {
            Some(keys) => match self.dispatch.dispatch(&query, &keys) {
                KeyDispatch::RequestBody => {
                    tracing::debug!(
                        target: "futon::client",
                        encoded_len = keys.len(),
                        "dispatching multi-key query as request body"
                    );
                    ViewRequest::post(path, params, format!("{{\"keys\":{keys}}}"))
                }
                KeyDispatch::UrlParam => {
                    let mut params = params;
                    query::push_param(&mut params, "keys", &keys);
                    ViewRequest::get(path, params, query.is_cacheable())
                }
            },
            None => ViewRequest::get(path, params, query.is_cacheable()),
        };
        Ok((request, query.ignores_not_found()))
    }

    fn execute(&self, request: &ViewRequest) -> Result<Box<dyn Read + Send>> {
        let response = self.transport.execute(request)?;
        if !(200..300).contains(&response.status) {
            let mut raw = Vec::new();
            response.body.take(ERROR_BODY_LIMIT).read_to_end(&mut raw)?;
            return Err(Error::Status {
                status: response.status,
                body: String::from_utf8_lossy(&raw).into_owned(),
            });
        }
        Ok(response.body)
    }
}
