use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;

static PROXY_ADDRESS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._~-]+$").expect("proxy address pattern is valid"));

/// An HTTP proxy reached as `http://host:port`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyEndpoint {
    host: String,
    port: u16,
}

impl ProxyEndpoint {
    /// Validates the address against `[a-zA-Z0-9._~-]+` and requires a
    /// positive port.
    pub fn new(host: impl Into<String>, port: i64) -> crate::Result<Self> {
        let host = host.into();
        if !PROXY_ADDRESS_PATTERN.is_match(&host) {
            return Err(Error::InvalidProxyAddress { address: host });
        }
        let port = u16::try_from(port)
            .ok()
            .filter(|port| *port > 0)
            .ok_or_else(|| Error::InvalidProxyPort {
                address: host.clone(),
                port,
            })?;
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub(crate) fn uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub(crate) fn to_ureq_proxy(&self) -> crate::Result<ureq::Proxy> {
        let uri = self.uri();
        ureq::Proxy::new(&uri).map_err(|_| Error::InvalidUri { uri })
    }
}

impl std::fmt::Display for ProxyEndpoint {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{},{}", self.host, self.port)
    }
}
