//! Outbound HTTP seam.
//!
//! Everything above this module sees the network as a single capability:
//! "GET this path on this mirror with these query parameters, within this
//! timeout". [`HttpTransport`] implements it with `reqwest`;
//! [`MockTransport`] scripts it for tests.

mod http;
mod mock;
mod request;

use std::future::Future;

use crate::error::Result;

pub use http::HttpTransport;
pub use mock::MockTransport;
pub use request::{Request, encode_component};

/// A black-box HTTP GET.
///
/// Returns the response body on a 2xx status. Implementations must honour
/// [`Request::timeout`].
pub trait Transport: Send + Sync + 'static {
    fn get(&self, request: &Request) -> impl Future<Output = Result<String>> + Send;
}
