use std::io::Read;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::header::{AUTHORIZATION, EXPECT, HeaderValue};
use http::{HeaderMap, Method, StatusCode};

use crate::error::{Error, TimeoutPhase, TransportErrorKind};
use crate::proxy::ProxyEndpoint;
use crate::request::{BasicAuth, WireRequest};
use crate::tls::{TlsBackend, TrustPolicy, build_tls_config};
use crate::util::redact_uri_for_logs;

/// Sends one attempt. Implementations must not share connection state
/// between calls.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &WireRequest,
        options: &TransportOptions,
    ) -> crate::Result<TransportResponse>;
}

/// Per-attempt client settings, identical for every attempt of a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportOptions {
    pub timeout: Duration,
    pub user_agent: String,
    pub proxy: Option<ProxyEndpoint>,
    pub basic_auth: Option<BasicAuth>,
    pub use_expect_continue: bool,
    pub trust_policy: TrustPolicy,
    pub tls_backend: TlsBackend,
}

pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Box<dyn Read + Send>,
}

impl TransportResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            headers,
            body: Box::new(body),
        }
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Builds a fresh `ureq` agent for every attempt and drops it with the
/// attempt's response body.
#[derive(Clone, Copy, Debug, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub(crate) fn make_agent(options: &TransportOptions) -> crate::Result<ureq::Agent> {
        options.tls_backend.ensure_available()?;
        let proxy = options
            .proxy
            .as_ref()
            .map(ProxyEndpoint::to_ureq_proxy)
            .transpose()?;
        let tls_config = build_tls_config(options.tls_backend, options.trust_policy);

        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .user_agent(options.user_agent.as_str())
            .timeout_global(Some(options.timeout))
            .timeout_connect(Some(options.timeout))
            .timeout_recv_response(Some(options.timeout))
            .timeout_recv_body(Some(options.timeout))
            .tls_config(tls_config)
            .proxy(proxy)
            .build();
        Ok(config.new_agent())
    }

    fn run<S: ureq::AsSendBody>(
        agent: &ureq::Agent,
        request: ureq::http::Request<S>,
        options: &TransportOptions,
        method: &Method,
        uri: &str,
    ) -> crate::Result<TransportResponse> {
        let response = agent
            .run(request)
            .map_err(|source| map_ureq_error(source, options.timeout, method, uri))?;
        let (parts, body) = response.into_parts();
        Ok(TransportResponse::new(
            parts.status,
            parts.headers,
            body.into_reader(),
        ))
    }
}

impl Transport for UreqTransport {
    fn send(
        &self,
        request: &WireRequest,
        options: &TransportOptions,
    ) -> crate::Result<TransportResponse> {
        let agent = Self::make_agent(options)?;
        let uri = redact_uri_for_logs(&request.url);

        let mut builder = ureq::http::Request::builder()
            .method(request.method.clone())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(basic_auth) = &options.basic_auth {
            builder = builder.header(AUTHORIZATION, basic_authorization(basic_auth)?);
        }

        match &request.body {
            Some(body) => {
                if options.use_expect_continue && !body.is_empty() {
                    builder = builder.header(EXPECT, HeaderValue::from_static("100-continue"));
                }
                let http_request = builder
                    .body(body.to_vec())
                    .map_err(|source| Error::RequestBuild { source })?;
                Self::run(&agent, http_request, options, &request.method, &uri)
            }
            None => {
                let http_request = builder
                    .body(())
                    .map_err(|source| Error::RequestBuild { source })?;
                Self::run(&agent, http_request, options, &request.method, &uri)
            }
        }
    }
}

pub(crate) fn basic_authorization(basic_auth: &BasicAuth) -> crate::Result<HeaderValue> {
    let credentials = STANDARD.encode(format!("{}:{}", basic_auth.id(), basic_auth.password()));
    let mut value = HeaderValue::from_str(&format!("Basic {credentials}")).map_err(|source| {
        Error::InvalidHeaderValue {
            name: AUTHORIZATION.as_str().to_owned(),
            source,
        }
    })?;
    value.set_sensitive(true);
    Ok(value)
}

fn map_ureq_error(source: ureq::Error, timeout: Duration, method: &Method, uri: &str) -> Error {
    match source {
        ureq::Error::Timeout(_) => Error::Timeout {
            phase: TimeoutPhase::Transport,
            timeout_ms: timeout.as_millis(),
            method: method.clone(),
            uri: uri.to_owned(),
        },
        other => Error::Transport {
            kind: classify_ureq_transport_error(&other),
            method: method.clone(),
            uri: uri.to_owned(),
            source: Box::new(other),
        },
    }
}

pub(crate) fn classify_ureq_transport_error(error: &ureq::Error) -> TransportErrorKind {
    match error {
        ureq::Error::HostNotFound => TransportErrorKind::Dns,
        ureq::Error::Tls(_) => TransportErrorKind::Tls,
        #[cfg(feature = "rustls")]
        ureq::Error::Rustls(_) => TransportErrorKind::Tls,
        #[cfg(feature = "native-tls")]
        ureq::Error::NativeTls(_) => TransportErrorKind::Tls,
        #[cfg(feature = "native-tls")]
        ureq::Error::Der(_) => TransportErrorKind::Tls,
        #[cfg(any(feature = "rustls", feature = "native-tls"))]
        ureq::Error::Pem(_) => TransportErrorKind::Tls,
        ureq::Error::ConnectProxyFailed(_) | ureq::Error::ConnectionFailed => {
            TransportErrorKind::Connect
        }
        ureq::Error::Io(source) => classify_io_error(source),
        _ => TransportErrorKind::Other,
    }
}

fn classify_io_error(source: &std::io::Error) -> TransportErrorKind {
    match source.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => TransportErrorKind::Read,
        std::io::ErrorKind::NotFound => TransportErrorKind::Dns,
        std::io::ErrorKind::ConnectionRefused
        | std::io::ErrorKind::ConnectionAborted
        | std::io::ErrorKind::NotConnected
        | std::io::ErrorKind::AddrNotAvailable => TransportErrorKind::Connect,
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::UnexpectedEof => TransportErrorKind::Read,
        _ => TransportErrorKind::Other,
    }
}

fn wrapped_ureq_error(io_error: &std::io::Error) -> Option<&ureq::Error> {
    io_error
        .get_ref()
        .and_then(|source| source.downcast_ref::<ureq::Error>())
}

/// Maps a failure while reading the response body of an attempt.
pub(crate) fn body_read_error(
    source: std::io::Error,
    method: &Method,
    uri: &str,
    timeout: Duration,
) -> Error {
    let timed_out = matches!(wrapped_ureq_error(&source), Some(ureq::Error::Timeout(_)))
        || source.kind() == std::io::ErrorKind::TimedOut;
    if timed_out {
        return Error::Timeout {
            phase: TimeoutPhase::ResponseBody,
            timeout_ms: timeout.as_millis(),
            method: method.clone(),
            uri: uri.to_owned(),
        };
    }
    Error::ReadBody {
        method: method.clone(),
        uri: uri.to_owned(),
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use http::Method;

    use super::{
        TransportOptions, UreqTransport, basic_authorization, body_read_error,
        classify_ureq_transport_error,
    };
    use crate::error::{Error, TimeoutPhase, TransportErrorKind};
    use crate::proxy::ProxyEndpoint;
    use crate::request::BasicAuth;
    use crate::tls::{TlsBackend, TrustPolicy};

    fn options() -> TransportOptions {
        TransportOptions {
            timeout: Duration::from_secs(1),
            user_agent: "httpexec-test".to_owned(),
            proxy: None,
            basic_auth: None,
            use_expect_continue: true,
            trust_policy: TrustPolicy::Validate,
            tls_backend: TlsBackend::default(),
        }
    }

    #[test]
    fn basic_authorization_encodes_id_and_password() {
        let value = basic_authorization(&BasicAuth::new("Aladdin", "open sesame"))
            .expect("header value");
        assert_eq!(value.to_str().expect("ascii"), "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
        assert!(value.is_sensitive());
    }

    #[test]
    fn agent_builds_with_proxy_and_accept_all_trust() {
        let mut options = options();
        options.proxy = Some(ProxyEndpoint::new("proxy.local", 3128).expect("proxy"));
        options.trust_policy = TrustPolicy::AcceptAll;
        assert!(UreqTransport::make_agent(&options).is_ok());
    }

    #[test]
    fn connection_failures_classify_as_connect() {
        assert_eq!(
            classify_ureq_transport_error(&ureq::Error::ConnectionFailed),
            TransportErrorKind::Connect
        );
        assert_eq!(
            classify_ureq_transport_error(&ureq::Error::HostNotFound),
            TransportErrorKind::Dns
        );
        assert_eq!(
            classify_ureq_transport_error(&ureq::Error::Io(std::io::Error::from(
                std::io::ErrorKind::ConnectionReset
            ))),
            TransportErrorKind::Read
        );
    }

    #[test]
    fn body_timeouts_map_to_response_body_phase() {
        let error = body_read_error(
            std::io::Error::from(std::io::ErrorKind::TimedOut),
            &Method::GET,
            "http://example.com/",
            Duration::from_millis(300),
        );
        assert!(matches!(
            error,
            Error::Timeout {
                phase: TimeoutPhase::ResponseBody,
                timeout_ms: 300,
                ..
            }
        ));

        let error = body_read_error(
            std::io::Error::from(std::io::ErrorKind::ConnectionReset),
            &Method::GET,
            "http://example.com/",
            Duration::from_millis(300),
        );
        assert!(matches!(error, Error::ReadBody { .. }));
    }
}
