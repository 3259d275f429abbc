//! `httpexec` sends one configured HTTP request with a fixed-interval retry
//! loop, a fresh connection per attempt and optional streaming of the
//! response body to a file.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use httpexec::prelude::HttpExecutor;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor = HttpExecutor::builder("https://api.example.com/search")
//!         .param("q", "rust http")
//!         .raw_param("sig", "a%2Fb")
//!         .basic_auth("user", "secret")
//!         .timeout(Duration::from_secs(5))
//!         .retry(2, Duration::from_millis(500))
//!         .build()?;
//!
//!     let response = executor.execute_get()?;
//!     println!("{} {}", response.status_code(), response.text()?);
//!
//!     let saved = executor.execute_get_to("/tmp/search.html")?;
//!     println!("saved to {:?}", saved.saved_to());
//!     Ok(())
//! }
//! ```
//!
//! Only a `200` ends the loop early. Any other status is retried and, once
//! the retries are spent, returned as a normal response rather than an
//! error. Redirects are never followed.

#[cfg(all(not(feature = "rustls"), not(feature = "native-tls")))]
compile_error!("httpexec requires one TLS backend feature: enable `rustls` or `native-tls`");

mod config;
mod error;
mod executor;
mod extensions;
mod headers;
mod proxy;
mod request;
mod response;
mod retry;
mod sink;
mod tls;
mod util;

pub use crate::config::{DEFAULT_CHARSET_ENV, PROXY_ADDRESS_ENV, PROXY_PORT_ENV, Settings};
pub use crate::error::{Error, ErrorCode, TimeoutPhase, TransportErrorKind};
pub use crate::executor::{
    DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, HttpExecutor, HttpExecutorBuilder, Transport,
    TransportOptions, TransportResponse, UreqTransport,
};
pub use crate::extensions::{Delay, SystemDelay};
pub use crate::headers::ResponseHeaders;
pub use crate::proxy::ProxyEndpoint;
pub use crate::request::{BasicAuth, RequestConfig, WireRequest};
pub use crate::response::Response;
pub use crate::retry::{AttemptOutcome, AttemptVerdict, RetryPolicy};
pub use crate::tls::{TlsBackend, TrustPolicy};

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use crate::{
        Error, ErrorCode, HttpExecutor, HttpExecutorBuilder, ProxyEndpoint, Response,
        ResponseHeaders, Result, RetryPolicy, Settings, TlsBackend, TrustPolicy,
    };
}
