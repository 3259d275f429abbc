use std::path::{Path, PathBuf};

use bytes::Bytes;
use http::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::headers::ResponseHeaders;
use crate::util::lookup_encoding;

/// Outcome of the attempt that ended an `execute_*` call.
#[derive(Clone, Debug)]
pub struct Response {
    status: StatusCode,
    headers: ResponseHeaders,
    body: Option<Bytes>,
    saved_to: Option<PathBuf>,
    header_charset: Option<String>,
    fallback_charset: String,
}

impl Response {
    pub(crate) fn new(
        status: StatusCode,
        headers: ResponseHeaders,
        body: Option<Bytes>,
        saved_to: Option<PathBuf>,
        header_charset: Option<String>,
        fallback_charset: String,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            saved_to,
            header_charset,
            fallback_charset,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Canonical reason phrase for the status, empty for unregistered codes.
    pub fn reason_phrase(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// True only for exactly `200 OK`.
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Buffered body. `None` for HEAD requests and for bodies written to a file.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn into_body(self) -> Option<Bytes> {
        self.body
    }

    pub fn saved_to(&self) -> Option<&Path> {
        self.saved_to.as_deref()
    }

    /// Charset used by [`Response::text`]: the `Content-Type` charset when the
    /// server declared one, otherwise the configured response charset.
    pub fn charset(&self) -> &str {
        self.header_charset
            .as_deref()
            .unwrap_or(&self.fallback_charset)
    }

    pub fn text(&self) -> crate::Result<String> {
        let Some(body) = &self.body else {
            return Ok(String::new());
        };
        let encoding = lookup_encoding(self.charset())?;
        let (text, _) = encoding.decode_without_bom_handling(body);
        Ok(text.into_owned())
    }

    pub fn json<T>(&self) -> crate::Result<T>
    where
        T: DeserializeOwned,
    {
        let body = self.body.as_deref().unwrap_or_default();
        serde_json::from_slice(body).map_err(|source| Error::Deserialize { source })
    }
}
