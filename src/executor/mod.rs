use std::sync::Arc;
use std::time::Duration;

use encoding_rs::Encoding;
use http::HeaderMap;

use crate::config::Settings;
use crate::extensions::Delay;
use crate::proxy::ProxyEndpoint;
use crate::request::{BasicAuth, RequestConfig};
use crate::retry::RetryPolicy;
use crate::tls::{TlsBackend, TrustPolicy};

mod builder;
mod execute;
mod transport;

pub use transport::{Transport, TransportOptions, TransportResponse, UreqTransport};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Proxy choice recorded by the builder and resolved against [`Settings`]
/// when the executor is built.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ProxyChoice {
    FromSettings,
    Explicit(ProxyEndpoint),
    Disabled,
}

/// Collects request options and produces an immutable [`HttpExecutor`].
pub struct HttpExecutorBuilder {
    url: String,
    settings: Settings,
    encoded_params: Vec<(String, String)>,
    raw_params: Vec<(String, String)>,
    headers: HeaderMap,
    timeout: Duration,
    proxy: ProxyChoice,
    basic_auth: Option<BasicAuth>,
    user_agent: Option<String>,
    trust_policy: TrustPolicy,
    tls_backend: TlsBackend,
    use_expect_continue: bool,
    retry_policy: RetryPolicy,
    request_encoding: Option<&'static Encoding>,
    response_encoding: Option<&'static Encoding>,
    transport: Arc<dyn Transport>,
    delay: Arc<dyn Delay>,
}

/// A configured request that can be sent any number of times.
///
/// Every `execute_*` call runs up to `max_retries + 1` attempts, each on a
/// fresh connection, and reports the last response or the last error.
#[derive(Clone)]
pub struct HttpExecutor {
    config: RequestConfig,
    transport: Arc<dyn Transport>,
    delay: Arc<dyn Delay>,
}

impl std::fmt::Debug for HttpExecutor {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for HttpExecutorBuilder {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpExecutorBuilder")
            .field("url", &self.url)
            .field("proxy", &self.proxy)
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}
