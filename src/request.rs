use std::borrow::Cow;
use std::time::Duration;

use bytes::Bytes;
use encoding_rs::Encoding;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{HeaderMap, Method};

use crate::error::Error;
use crate::proxy::ProxyEndpoint;
use crate::retry::RetryPolicy;
use crate::tls::{TlsBackend, TrustPolicy};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Credentials offered for BASIC authentication on every request.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    id: String,
    password: String,
}

impl BasicAuth {
    pub fn new(id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            password: password.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("BasicAuth")
            .field("id", &self.id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything an `execute_*` call needs, frozen when the executor is built.
#[derive(Clone, Debug)]
pub struct RequestConfig {
    pub(crate) url: String,
    pub(crate) encoded_params: Vec<(String, String)>,
    pub(crate) raw_params: Vec<(String, String)>,
    pub(crate) headers: HeaderMap,
    pub(crate) timeout: Duration,
    pub(crate) proxy: Option<ProxyEndpoint>,
    pub(crate) basic_auth: Option<BasicAuth>,
    pub(crate) user_agent: Option<String>,
    pub(crate) trust_policy: TrustPolicy,
    pub(crate) tls_backend: TlsBackend,
    pub(crate) use_expect_continue: bool,
    pub(crate) retry_policy: RetryPolicy,
    pub(crate) request_encoding: &'static Encoding,
    pub(crate) response_charset: String,
}

impl RequestConfig {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn encoded_params(&self) -> &[(String, String)] {
        &self.encoded_params
    }

    pub fn raw_params(&self) -> &[(String, String)] {
        &self.raw_params
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn proxy(&self) -> Option<&ProxyEndpoint> {
        self.proxy.as_ref()
    }

    pub fn basic_auth(&self) -> Option<&BasicAuth> {
        self.basic_auth.as_ref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn trust_policy(&self) -> TrustPolicy {
        self.trust_policy
    }

    pub fn tls_backend(&self) -> TlsBackend {
        self.tls_backend
    }

    pub fn use_expect_continue(&self) -> bool {
        self.use_expect_continue
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub fn request_encoding(&self) -> &'static Encoding {
        self.request_encoding
    }

    /// Charset used to decode bodies whose `Content-Type` declares none.
    pub fn response_charset(&self) -> &str {
        &self.response_charset
    }

    /// Builds the request actually put on the wire for `method`.
    ///
    /// GET and HEAD carry the parameters in the query string; POST carries
    /// them as a form body. In both cases the encoded parameters come first
    /// and the raw ones are appended verbatim.
    pub fn wire_request(&self, method: &Method) -> crate::Result<WireRequest> {
        let parameters = self.encode_parameters();
        let mut headers = self.headers.clone();

        if *method == Method::POST {
            let body = if parameters.is_empty() {
                None
            } else {
                if !headers.contains_key(CONTENT_TYPE) {
                    let content_type =
                        format!("{FORM_CONTENT_TYPE}; charset={}", self.request_encoding.name());
                    let value = HeaderValue::from_str(&content_type).map_err(|source| {
                        Error::InvalidHeaderValue {
                            name: CONTENT_TYPE.as_str().to_owned(),
                            source,
                        }
                    })?;
                    headers.insert(CONTENT_TYPE, value);
                }
                Some(Bytes::from(parameters))
            };
            return Ok(WireRequest {
                method: method.clone(),
                url: self.url.clone(),
                headers,
                body,
            });
        }

        let url = if parameters.is_empty() {
            self.url.clone()
        } else {
            format!("{}?{parameters}", self.url)
        };
        Ok(WireRequest {
            method: method.clone(),
            url,
            headers,
            body: None,
        })
    }

    fn encode_parameters(&self) -> String {
        let encoded = encode_pairs(&self.encoded_params, self.request_encoding);
        append_raw_pairs(encoded, &self.raw_params)
    }
}

/// A fully resolved request: target URL, headers and optional body.
#[derive(Clone, Debug, PartialEq)]
pub struct WireRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

pub(crate) fn encode_pairs(pairs: &[(String, String)], encoding: &'static Encoding) -> String {
    if pairs.is_empty() {
        return String::new();
    }

    let encode: &dyn Fn(&str) -> Cow<'_, [u8]> = &|text| encoding.encode(text).0;
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    serializer.encoding_override(Some(encode));
    for (name, value) in pairs {
        serializer.append_pair(name, value);
    }
    serializer.finish()
}

pub(crate) fn append_raw_pairs(mut query: String, raw_pairs: &[(String, String)]) -> String {
    for (name, value) in raw_pairs {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(name);
        query.push('=');
        query.push_str(value);
    }
    query
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use encoding_rs::{SHIFT_JIS, UTF_8};
    use http::header::{CONTENT_TYPE, HeaderValue};
    use http::{HeaderMap, Method};

    use super::{BasicAuth, RequestConfig, append_raw_pairs, encode_pairs};
    use crate::retry::RetryPolicy;
    use crate::tls::{TlsBackend, TrustPolicy};

    fn pairs(values: &[(&str, &str)]) -> Vec<(String, String)> {
        values
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect()
    }

    fn config(encoded: &[(&str, &str)], raw: &[(&str, &str)]) -> RequestConfig {
        RequestConfig {
            url: "http://example.com/search".to_owned(),
            encoded_params: pairs(encoded),
            raw_params: pairs(raw),
            headers: HeaderMap::new(),
            timeout: Duration::from_secs(10),
            proxy: None,
            basic_auth: None,
            user_agent: None,
            trust_policy: TrustPolicy::Validate,
            tls_backend: TlsBackend::default(),
            use_expect_continue: true,
            retry_policy: RetryPolicy::disabled(),
            request_encoding: UTF_8,
            response_charset: "UTF-8".to_owned(),
        }
    }

    #[test]
    fn get_without_parameters_keeps_bare_url() {
        let request = config(&[], &[])
            .wire_request(&Method::GET)
            .expect("wire request");
        assert_eq!(request.url, "http://example.com/search");
        assert!(request.body.is_none());
    }

    #[test]
    fn get_encodes_then_appends_raw_parameters() {
        let request = config(
            &[("q", "a b&c"), ("q", "second")],
            &[("sig", "x%2By"), ("t", "1")],
        )
        .wire_request(&Method::GET)
        .expect("wire request");
        assert_eq!(
            request.url,
            "http://example.com/search?q=a+b%26c&q=second&sig=x%2By&t=1"
        );
    }

    #[test]
    fn raw_parameters_alone_do_not_start_with_separator() {
        let request = config(&[], &[("a", "1"), ("b", "2")])
            .wire_request(&Method::HEAD)
            .expect("wire request");
        assert_eq!(request.url, "http://example.com/search?a=1&b=2");
    }

    #[test]
    fn request_encoding_controls_percent_encoding() {
        assert_eq!(
            encode_pairs(&pairs(&[("name", "テスト")]), SHIFT_JIS),
            "name=%83e%83X%83g"
        );
        assert_eq!(
            encode_pairs(&pairs(&[("name", "テスト")]), UTF_8),
            "name=%E3%83%86%E3%82%B9%E3%83%88"
        );
    }

    #[test]
    fn post_puts_parameters_in_form_body() {
        let request = config(&[("name", "a b")], &[("raw", "%41")])
            .wire_request(&Method::POST)
            .expect("wire request");
        assert_eq!(request.url, "http://example.com/search");
        assert_eq!(
            request.body.as_deref(),
            Some(b"name=a+b&raw=%41".as_slice())
        );
        assert_eq!(
            request.headers.get(CONTENT_TYPE),
            Some(&HeaderValue::from_static(
                "application/x-www-form-urlencoded; charset=UTF-8"
            ))
        );
    }

    #[test]
    fn post_without_parameters_has_no_body() {
        let request = config(&[], &[])
            .wire_request(&Method::POST)
            .expect("wire request");
        assert!(request.body.is_none());
        assert!(request.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn caller_content_type_is_preserved_for_post() {
        let mut config = config(&[("a", "1")], &[]);
        config
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let request = config.wire_request(&Method::POST).expect("wire request");
        assert_eq!(
            request.headers.get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("text/plain"))
        );
    }

    #[test]
    fn append_raw_pairs_joins_with_ampersand() {
        assert_eq!(
            append_raw_pairs("a=1".to_owned(), &pairs(&[("b", "2")])),
            "a=1&b=2"
        );
        assert_eq!(append_raw_pairs(String::new(), &[]), "");
    }

    #[test]
    fn basic_auth_debug_redacts_password() {
        let auth = BasicAuth::new("user", "secret");
        let rendered = format!("{auth:?}");
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("secret"));
    }
}
