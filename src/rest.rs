#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

use reqwest::{
    StatusCode,
    blocking::{Client, Response},
};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors produced by the REST session and the typed client built on top of
/// it. `Forbidden` is kept as its own variant because the clear workflow
/// needs to tell "the platform denied access to this one submission" apart
/// from every other failure.
#[derive(Debug, Error)]
pub enum RestError {
    /// The platform answered 403 for the given path.
    #[error("access to `{path}` was denied")]
    Forbidden {
        /// Path of the denied request, relative to the API base.
        path: String,
    },
    /// The platform answered with an unexpected status code.
    #[error("request to `{path}` failed with status {status}")]
    Status {
        /// Path of the failed request, relative to the API base.
        path:   String,
        /// The status code the platform answered with.
        status: StatusCode,
    },
    /// The request never produced a usable response.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    /// A listing response did not carry usable pagination headers.
    #[error("response from `{path}` is missing the pagination headers")]
    Pagination {
        /// Path of the listing request.
        path: String,
    },
    /// The response body could not be decoded into the expected shape.
    #[error("could not decode the response from `{path}`")]
    Decode {
        /// Path of the request whose body failed to decode.
        path:   String,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// Pagination metadata reported by a listing endpoint alongside its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// The page this response covers, 1-based.
    pub current: u32,
    /// Total number of pages in the listing.
    pub total:   u32,
}

impl PageInfo {
    /// Reads the `Current-Page`/`Total-Pages` pair from a response's
    /// headers. Detail endpoints do not carry them, so their absence is not
    /// an error here; only listing fetches insist on them.
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Option<Self> {
        /// Reads one numeric pagination header.
        fn header(headers: &reqwest::header::HeaderMap, name: &str) -> Option<u32> {
            headers
                .get(name)?
                .to_str()
                .ok()?
                .parse()
                .ok()
        }

        Some(Self {
            current: header(headers, "Current-Page")?,
            total:   header(headers, "Total-Pages")?,
        })
    }
}

/// Collects a complete listing from a page-based endpoint.
///
/// Calls `fetch` with page numbers starting at 1 and appends each batch in
/// the order the server emitted it, stopping once the reported current page
/// has reached the reported total. A listing with zero results reports its
/// first page as also being its last, so the loop always terminates. Any
/// error from `fetch` aborts the whole collection; there is no
/// partial-result recovery at this layer.
pub fn collect_pages<T, E, F>(mut fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(u32) -> Result<(Vec<T>, PageInfo), E>,
{
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let (mut batch, info) = fetch(page)?;
        items.append(&mut batch);
        if info.current >= info.total {
            return Ok(items);
        }
        page += 1;
    }
}

/// A blocking HTTP session that authenticates every request with a bearer
/// token and enforces a fixed minimum delay between consecutive calls.
///
/// The delay is a property of the transport, not of the workflows built on
/// it; the engine's strictly sequential design is what makes a fixed-interval
/// throttle sufficient.
pub struct RestSession {
    /// The shared blocking HTTP client.
    client:    Client,
    /// API base URL, with a trailing slash.
    base_url:  String,
    /// Bearer credential sent with every request.
    token:     String,
    /// Minimum gap between consecutive requests.
    throttle:  Duration,
    /// Instant of the most recent request, if any.
    last_call: Mutex<Option<Instant>>,
}

impl RestSession {
    /// Creates a session for the given API base, credential, and inter-call
    /// delay.
    pub fn new(base_url: &str, token: &str, throttle: Duration) -> Result<Self, RestError> {
        let client = Client::builder().no_proxy().build()?;
        Ok(Self {
            client,
            base_url: format!("{}/", base_url.trim_end_matches('/')),
            token: token.to_owned(),
            throttle,
            last_call: Mutex::new(None),
        })
    }

    /// Sleeps for whatever remains of the minimum inter-call gap, then stamps
    /// the current instant.
    fn pace(&self) {
        let mut last = self.last_call.lock().expect("throttle stamp poisoned");
        if let Some(at) = *last {
            let elapsed = at.elapsed();
            if elapsed < self.throttle {
                std::thread::sleep(self.throttle - elapsed);
            }
        }
        *last = Some(Instant::now());
    }

    /// Maps a response to `RestError` unless its status is a success.
    fn check_status(path: &str, response: Response) -> Result<Response, RestError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::FORBIDDEN => Err(RestError::Forbidden { path: path.to_owned() }),
            status => Err(RestError::Status {
                path: path.to_owned(),
                status,
            }),
        }
    }

    /// Issues a GET for `path` (relative to the base URL) with the given
    /// query parameters, returning the JSON body together with the
    /// `Current-Page`/`Total-Pages` pagination metadata when the response
    /// carries it. Detail endpoints answer without it.
    pub fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<(Value, Option<PageInfo>), RestError> {
        self.pace();
        debug!(path, "GET");
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .query(params)
            .send()?;
        let response = Self::check_status(path, response)?;
        let pages = PageInfo::from_headers(response.headers());
        let body = response.json()?;
        Ok((body, pages))
    }

    /// Issues a GET for an absolute URL and returns the body decoded as text.
    /// Used for student-uploaded attachments, which live outside the API.
    pub fn get_text(&self, url: &str) -> Result<String, RestError> {
        self.pace();
        debug!(url, "GET (raw)");
        let response = self.client.get(url).send()?;
        let response = Self::check_status(url, response)?;
        Ok(response.text()?)
    }

    /// Issues a POST for `path` with a JSON body.
    pub fn post(&self, path: &str, body: &Value) -> Result<(), RestError> {
        self.pace();
        debug!(path, "POST");
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .json(body)
            .send()?;
        Self::check_status(path, response).map(|_| ())
    }

    /// Issues a DELETE for `path`.
    pub fn delete(&self, path: &str) -> Result<(), RestError> {
        self.pace();
        debug!(path, "DELETE");
        let response = self
            .client
            .delete(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()?;
        Self::check_status(path, response).map(|_| ())
    }

}
