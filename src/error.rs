use std::path::PathBuf;

use http::Method;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TransportErrorKind {
    Dns,
    Connect,
    Tls,
    Read,
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Dns => "dns",
            Self::Connect => "connect",
            Self::Tls => "tls",
            Self::Read => "read",
            Self::Other => "other",
        };
        formatter.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimeoutPhase {
    Transport,
    ResponseBody,
}

impl std::fmt::Display for TimeoutPhase {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Transport => "transport",
            Self::ResponseBody => "response_body",
        };
        formatter.write_str(text)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCode {
    MissingUrl,
    InvalidUri,
    InvalidProxyAddress,
    InvalidProxyPort,
    MissingParentDirectory,
    UnsupportedCharset,
    InvalidHeaderName,
    InvalidHeaderValue,
    SerializeParams,
    TlsBackendUnavailable,
    InvalidEnvironment,
    RequestBuild,
    Transport,
    Timeout,
    ReadBody,
    SaveFile,
    Deserialize,
    Interrupted,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingUrl => "missing_url",
            Self::InvalidUri => "invalid_uri",
            Self::InvalidProxyAddress => "invalid_proxy_address",
            Self::InvalidProxyPort => "invalid_proxy_port",
            Self::MissingParentDirectory => "missing_parent_directory",
            Self::UnsupportedCharset => "unsupported_charset",
            Self::InvalidHeaderName => "invalid_header_name",
            Self::InvalidHeaderValue => "invalid_header_value",
            Self::SerializeParams => "serialize_params",
            Self::TlsBackendUnavailable => "tls_backend_unavailable",
            Self::InvalidEnvironment => "invalid_environment",
            Self::RequestBuild => "request_build",
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::ReadBody => "read_body",
            Self::SaveFile => "save_file",
            Self::Deserialize => "deserialize",
            Self::Interrupted => "interrupted",
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("request url is not set")]
    MissingUrl,
    #[error("invalid request uri: {uri}")]
    InvalidUri { uri: String },
    #[error("invalid proxy address: {address}")]
    InvalidProxyAddress { address: String },
    #[error("invalid proxy port {port} for proxy {address}")]
    InvalidProxyPort { address: String, port: i64 },
    #[error("parent directory does not exist for save path {}", path.display())]
    MissingParentDirectory { path: PathBuf },
    #[error("unsupported charset: {charset}")]
    UnsupportedCharset { charset: String },
    #[error("invalid header name {name}: {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },
    #[error("invalid header value for {name}: {source}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("failed to serialize request parameters: {source}")]
    SerializeParams {
        #[source]
        source: serde_urlencoded::ser::Error,
    },
    #[error("requested tls backend is not enabled in this build: {backend}")]
    TlsBackendUnavailable { backend: &'static str },
    #[error("invalid environment variable {name}={value}")]
    InvalidEnvironment { name: &'static str, value: String },
    #[error("failed to build http request: {source}")]
    RequestBuild {
        #[source]
        source: http::Error,
    },
    #[error("http transport error ({kind}) for {method} {uri}: {source}")]
    Transport {
        kind: TransportErrorKind,
        method: Method,
        uri: String,
        #[source]
        source: BoxError,
    },
    #[error("http request timed out in {phase} after {timeout_ms}ms for {method} {uri}")]
    Timeout {
        phase: TimeoutPhase,
        timeout_ms: u128,
        method: Method,
        uri: String,
    },
    #[error("failed to read response body for {method} {uri}: {source}")]
    ReadBody {
        method: Method,
        uri: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to write response body to {}: {source}", path.display())]
    SaveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode response json: {source}")]
    Deserialize {
        #[source]
        source: serde_json::Error,
    },
    #[error("retry wait interrupted after attempt {attempt}/{max_attempts} for {method} {uri}")]
    Interrupted {
        attempt: usize,
        max_attempts: usize,
        method: Method,
        uri: String,
    },
}

impl Error {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingUrl => ErrorCode::MissingUrl,
            Self::InvalidUri { .. } => ErrorCode::InvalidUri,
            Self::InvalidProxyAddress { .. } => ErrorCode::InvalidProxyAddress,
            Self::InvalidProxyPort { .. } => ErrorCode::InvalidProxyPort,
            Self::MissingParentDirectory { .. } => ErrorCode::MissingParentDirectory,
            Self::UnsupportedCharset { .. } => ErrorCode::UnsupportedCharset,
            Self::InvalidHeaderName { .. } => ErrorCode::InvalidHeaderName,
            Self::InvalidHeaderValue { .. } => ErrorCode::InvalidHeaderValue,
            Self::SerializeParams { .. } => ErrorCode::SerializeParams,
            Self::TlsBackendUnavailable { .. } => ErrorCode::TlsBackendUnavailable,
            Self::InvalidEnvironment { .. } => ErrorCode::InvalidEnvironment,
            Self::RequestBuild { .. } => ErrorCode::RequestBuild,
            Self::Transport { .. } => ErrorCode::Transport,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::ReadBody { .. } => ErrorCode::ReadBody,
            Self::SaveFile { .. } => ErrorCode::SaveFile,
            Self::Deserialize { .. } => ErrorCode::Deserialize,
            Self::Interrupted { .. } => ErrorCode::Interrupted,
        }
    }

    /// Errors raised from configuration, before any network attempt is made.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingUrl
                | Self::InvalidUri { .. }
                | Self::InvalidProxyAddress { .. }
                | Self::InvalidProxyPort { .. }
                | Self::MissingParentDirectory { .. }
                | Self::UnsupportedCharset { .. }
                | Self::InvalidHeaderName { .. }
                | Self::InvalidHeaderValue { .. }
                | Self::SerializeParams { .. }
                | Self::TlsBackendUnavailable { .. }
                | Self::InvalidEnvironment { .. }
        )
    }

    /// Failures of a single attempt that the retry policy may try again.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Timeout { .. }
                | Self::ReadBody { .. }
                | Self::SaveFile { .. }
        )
    }

    pub fn transport_error_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Self::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn timeout_phase(&self) -> Option<TimeoutPhase> {
        match self {
            Self::Timeout { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use http::Method;

    use super::{Error, ErrorCode, TimeoutPhase, TransportErrorKind};

    #[test]
    fn configuration_errors_are_never_retryable() {
        let error = Error::MissingParentDirectory {
            path: PathBuf::from("/missing/dir/out.bin"),
        };
        assert!(error.is_configuration());
        assert!(!error.is_retryable());
        assert_eq!(error.code().as_str(), "missing_parent_directory");
    }

    #[test]
    fn transport_and_timeout_errors_are_retryable() {
        let transport = Error::Transport {
            kind: TransportErrorKind::Connect,
            method: Method::GET,
            uri: "http://127.0.0.1:1/".to_owned(),
            source: Box::new(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)),
        };
        let timeout = Error::Timeout {
            phase: TimeoutPhase::Transport,
            timeout_ms: 250,
            method: Method::GET,
            uri: "http://127.0.0.1:1/".to_owned(),
        };

        assert!(transport.is_retryable());
        assert!(!transport.is_configuration());
        assert_eq!(
            transport.transport_error_kind(),
            Some(TransportErrorKind::Connect)
        );
        assert!(timeout.is_retryable());
        assert_eq!(timeout.timeout_phase(), Some(TimeoutPhase::Transport));
        assert_eq!(timeout.code(), ErrorCode::Timeout);
    }

    #[test]
    fn transport_error_display_names_kind_method_and_uri() {
        let error = Error::Transport {
            kind: TransportErrorKind::Dns,
            method: Method::HEAD,
            uri: "https://unknown.invalid/".to_owned(),
            source: "host not found".into(),
        };
        assert_eq!(
            error.to_string(),
            "http transport error (dns) for HEAD https://unknown.invalid/: host not found"
        );
    }
}
