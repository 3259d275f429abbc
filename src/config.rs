use std::sync::LazyLock;

use tracing::warn;

use crate::error::Error;
use crate::proxy::ProxyEndpoint;
use crate::util::lookup_encoding;

pub const PROXY_ADDRESS_ENV: &str = "HTTPEXEC_PROXY_ADDRESS";
pub const PROXY_PORT_ENV: &str = "HTTPEXEC_PROXY_PORT";
pub const DEFAULT_CHARSET_ENV: &str = "HTTPEXEC_DEFAULT_CHARSET";

const FALLBACK_CHARSET: &str = "UTF-8";

static GLOBAL_SETTINGS: LazyLock<Settings> = LazyLock::new(|| match Settings::from_env() {
    Ok(settings) => settings,
    Err(error) => {
        warn!(
            code = "settings.invalid",
            error = %error,
            "ignoring malformed environment settings"
        );
        Settings::default()
    }
});

/// Process-wide defaults consulted when an executor builder is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    default_proxy: Option<ProxyEndpoint>,
    default_charset: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_proxy: None,
            default_charset: FALLBACK_CHARSET.to_owned(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings loaded once per process from the environment.
    pub fn global() -> &'static Settings {
        &GLOBAL_SETTINGS
    }

    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let (Some(address), Some(port)) = (lookup(PROXY_ADDRESS_ENV), lookup(PROXY_PORT_ENV)) {
            let port = port.trim();
            if !address.is_empty() && !port.is_empty() {
                let port = port.parse::<i64>().map_err(|_| Error::InvalidEnvironment {
                    name: PROXY_PORT_ENV,
                    value: port.to_owned(),
                })?;
                settings.default_proxy = Some(ProxyEndpoint::new(address, port)?);
            }
        }

        if let Some(charset) = lookup(DEFAULT_CHARSET_ENV)
            && !charset.trim().is_empty()
        {
            settings = settings.with_default_charset(&charset)?;
        }

        Ok(settings)
    }

    pub fn with_default_proxy(mut self, proxy: ProxyEndpoint) -> Self {
        self.default_proxy = Some(proxy);
        self
    }

    pub fn without_default_proxy(mut self) -> Self {
        self.default_proxy = None;
        self
    }

    pub fn with_default_charset(mut self, charset: &str) -> crate::Result<Self> {
        self.default_charset = lookup_encoding(charset)?.name().to_owned();
        Ok(self)
    }

    pub fn default_proxy(&self) -> Option<&ProxyEndpoint> {
        self.default_proxy.as_ref()
    }

    pub fn default_charset(&self) -> &str {
        &self.default_charset
    }
}
