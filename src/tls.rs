use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TlsBackend {
    Rustls,
    NativeTls,
}

impl TlsBackend {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rustls => "rustls",
            Self::NativeTls => "native-tls",
        }
    }

    pub(crate) const fn default_backend() -> Self {
        #[cfg(feature = "rustls")]
        {
            return Self::Rustls;
        }
        #[allow(unreachable_code)]
        Self::NativeTls
    }

    pub(crate) const fn is_available(self) -> bool {
        match self {
            Self::Rustls => cfg!(feature = "rustls"),
            Self::NativeTls => cfg!(feature = "native-tls"),
        }
    }

    pub(crate) fn ensure_available(self) -> Result<(), Error> {
        if self.is_available() {
            Ok(())
        } else {
            Err(Error::TlsBackendUnavailable {
                backend: self.as_str(),
            })
        }
    }
}

impl Default for TlsBackend {
    fn default() -> Self {
        Self::default_backend()
    }
}

/// Certificate and hostname validation applied to every TLS connection of a
/// call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrustPolicy {
    /// Platform/webpki chain validation plus hostname verification.
    #[default]
    Validate,
    /// Any server certificate and any hostname is accepted.
    AcceptAll,
}

impl TrustPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::AcceptAll => "accept_all",
        }
    }

    pub const fn verifies_peer(self) -> bool {
        matches!(self, Self::Validate)
    }
}

pub(crate) fn build_tls_config(
    backend: TlsBackend,
    trust_policy: TrustPolicy,
) -> ureq::tls::TlsConfig {
    let provider = match backend {
        TlsBackend::Rustls => ureq::tls::TlsProvider::Rustls,
        TlsBackend::NativeTls => ureq::tls::TlsProvider::NativeTls,
    };

    ureq::tls::TlsConfig::builder()
        .provider(provider)
        .disable_verification(!trust_policy.verifies_peer())
        .build()
}

#[cfg(test)]
mod tests {
    use super::{TlsBackend, TrustPolicy, build_tls_config};

    #[test]
    fn trust_policy_defaults_to_validation() {
        assert_eq!(TrustPolicy::default(), TrustPolicy::Validate);
        assert!(TrustPolicy::Validate.verifies_peer());
        assert!(!TrustPolicy::AcceptAll.verifies_peer());
    }

    #[test]
    fn accept_all_disables_verification_in_tls_config() {
        let backend = TlsBackend::default();
        assert!(backend.is_available());

        let validating = build_tls_config(backend, TrustPolicy::Validate);
        let accepting = build_tls_config(backend, TrustPolicy::AcceptAll);

        assert!(!validating.disable_verification());
        assert!(accepting.disable_verification());
    }

    #[cfg(not(feature = "native-tls"))]
    #[test]
    fn unavailable_backend_is_rejected() {
        let error = TlsBackend::NativeTls
            .ensure_available()
            .expect_err("native-tls is not compiled in");
        assert!(error.is_configuration());
    }
}
