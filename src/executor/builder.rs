use std::sync::Arc;
use std::time::Duration;

use encoding_rs::Encoding;
use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use serde::Serialize;

use crate::config::Settings;
use crate::error::Error;
use crate::extensions::{Delay, SystemDelay};
use crate::proxy::ProxyEndpoint;
use crate::request::{BasicAuth, RequestConfig};
use crate::retry::RetryPolicy;
use crate::tls::{TlsBackend, TrustPolicy};
use crate::util::{lookup_encoding, parse_header_name, parse_header_value, validate_url};

use super::transport::{Transport, UreqTransport};
use super::{DEFAULT_TIMEOUT, HttpExecutor, HttpExecutorBuilder, ProxyChoice};

const MIN_TIMEOUT: Duration = Duration::from_millis(1);

impl HttpExecutorBuilder {
    pub(crate) fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            settings: Settings::global().clone(),
            encoded_params: Vec::new(),
            raw_params: Vec::new(),
            headers: HeaderMap::new(),
            timeout: DEFAULT_TIMEOUT,
            proxy: ProxyChoice::FromSettings,
            basic_auth: None,
            user_agent: None,
            trust_policy: TrustPolicy::default(),
            tls_backend: TlsBackend::default(),
            use_expect_continue: true,
            retry_policy: RetryPolicy::disabled(),
            request_encoding: None,
            response_encoding: None,
            transport: Arc::new(UreqTransport),
            delay: Arc::new(SystemDelay),
        }
    }

    /// Replaces the process-wide defaults this builder falls back to.
    pub fn settings(mut self, settings: &Settings) -> Self {
        self.settings = settings.clone();
        self
    }

    /// Adds a parameter that is percent-encoded with the request encoding.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.encoded_params.push((name.into(), value.into()));
        self
    }

    /// Adds every field of `params` as an encoded parameter, in field order.
    pub fn params<T>(mut self, params: &T) -> crate::Result<Self>
    where
        T: Serialize + ?Sized,
    {
        let query = serde_urlencoded::to_string(params)
            .map_err(|source| Error::SerializeParams { source })?;
        self.encoded_params
            .extend(url::form_urlencoded::parse(query.as_bytes()).into_owned());
        Ok(self)
    }

    /// Adds a parameter that is sent exactly as given.
    pub fn raw_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.raw_params.push((name.into(), value.into()));
        self
    }

    pub fn basic_auth(mut self, id: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some(BasicAuth::new(id, password));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.max(MIN_TIMEOUT);
        self
    }

    pub fn timeout_secs(self, seconds: u64) -> Self {
        self.timeout(Duration::from_secs(seconds))
    }

    pub fn proxy(mut self, proxy: ProxyEndpoint) -> Self {
        self.proxy = ProxyChoice::Explicit(proxy);
        self
    }

    pub fn try_proxy(self, address: impl Into<String>, port: i64) -> crate::Result<Self> {
        let proxy = ProxyEndpoint::new(address, port)?;
        Ok(self.proxy(proxy))
    }

    /// Connects directly even when the settings carry a default proxy.
    pub fn no_proxy(mut self) -> Self {
        self.proxy = ProxyChoice::Disabled;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn request_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.request_encoding = Some(encoding);
        self
    }

    pub fn try_request_encoding(self, charset: &str) -> crate::Result<Self> {
        let encoding = lookup_encoding(charset)?;
        Ok(self.request_encoding(encoding))
    }

    /// Charset used to decode response bodies whose `Content-Type` names none.
    pub fn response_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.response_encoding = Some(encoding);
        self
    }

    pub fn try_response_encoding(self, charset: &str) -> crate::Result<Self> {
        let encoding = lookup_encoding(charset)?;
        Ok(self.response_encoding(encoding))
    }

    pub fn trust_policy(mut self, trust_policy: TrustPolicy) -> Self {
        self.trust_policy = trust_policy;
        self
    }

    /// Accepts any server certificate and host name. Only for test servers.
    pub fn danger_accept_invalid_certs(self, accept: bool) -> Self {
        let trust_policy = if accept {
            TrustPolicy::AcceptAll
        } else {
            TrustPolicy::Validate
        };
        self.trust_policy(trust_policy)
    }

    pub fn tls_backend(mut self, tls_backend: TlsBackend) -> Self {
        self.tls_backend = tls_backend;
        self
    }

    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn retry(self, max_retries: usize, interval: Duration) -> Self {
        self.retry_policy(RetryPolicy::new(max_retries, interval))
    }

    pub fn expect_continue(mut self, enabled: bool) -> Self {
        self.use_expect_continue = enabled;
        self
    }

    /// Sets a header sent on every attempt. A later value for the same name
    /// replaces the earlier one.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn try_header(self, name: &str, value: &str) -> crate::Result<Self> {
        let header_name = parse_header_name(name)?;
        let header_value = parse_header_value(name, value)?;
        Ok(self.header(header_name, header_value))
    }

    pub fn transport_arc(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn transport<T>(self, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        self.transport_arc(Arc::new(transport))
    }

    pub fn delay_arc(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn delay<D>(self, delay: D) -> Self
    where
        D: Delay + 'static,
    {
        self.delay_arc(Arc::new(delay))
    }

    pub fn build(self) -> crate::Result<HttpExecutor> {
        validate_url(&self.url)?;
        self.tls_backend.ensure_available()?;

        let proxy = match self.proxy {
            ProxyChoice::FromSettings => self.settings.default_proxy().cloned(),
            ProxyChoice::Explicit(proxy) => Some(proxy),
            ProxyChoice::Disabled => None,
        };
        let default_encoding = lookup_encoding(self.settings.default_charset())?;
        let request_encoding = self.request_encoding.unwrap_or(default_encoding);
        let response_charset = self
            .response_encoding
            .unwrap_or(default_encoding)
            .name()
            .to_owned();

        Ok(HttpExecutor {
            config: RequestConfig {
                url: self.url,
                encoded_params: self.encoded_params,
                raw_params: self.raw_params,
                headers: self.headers,
                timeout: self.timeout,
                proxy,
                basic_auth: self.basic_auth,
                user_agent: self.user_agent,
                trust_policy: self.trust_policy,
                tls_backend: self.tls_backend,
                use_expect_continue: self.use_expect_continue,
                retry_policy: self.retry_policy,
                request_encoding,
                response_charset,
            },
            transport: self.transport,
            delay: self.delay,
        })
    }
}
