use std::path::Path;

use http::Method;
use http::header::CONTENT_TYPE;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::headers::{ResponseHeaders, content_type_charset};
use crate::request::{RequestConfig, WireRequest};
use crate::response::Response;
use crate::retry::{AttemptOutcome, AttemptVerdict};
use crate::sink::{ResponseSink, ensure_parent_directory};
use crate::util::redact_uri_for_logs;

use super::transport::{TransportOptions, body_read_error};
use super::{DEFAULT_USER_AGENT, HttpExecutor, HttpExecutorBuilder};

const NONE_TEXT: &str = "(none)";

impl HttpExecutor {
    pub fn builder(url: impl Into<String>) -> HttpExecutorBuilder {
        HttpExecutorBuilder::new(url)
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn execute_get(&self) -> crate::Result<Response> {
        self.execute(Method::GET, None)
    }

    /// Like [`execute_get`](Self::execute_get), but a `200` body is written
    /// to `path` instead of being kept in memory.
    pub fn execute_get_to(&self, path: impl AsRef<Path>) -> crate::Result<Response> {
        self.execute(Method::GET, Some(path.as_ref()))
    }

    pub fn execute_head(&self) -> crate::Result<Response> {
        self.execute(Method::HEAD, None)
    }

    pub fn execute_post(&self) -> crate::Result<Response> {
        self.execute(Method::POST, None)
    }

    pub fn execute_post_to(&self, path: impl AsRef<Path>) -> crate::Result<Response> {
        self.execute(Method::POST, Some(path.as_ref()))
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            timeout: self.config.timeout,
            user_agent: self
                .config
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
            proxy: self.config.proxy.clone(),
            basic_auth: self.config.basic_auth.clone(),
            use_expect_continue: self.config.use_expect_continue,
            trust_policy: self.config.trust_policy,
            tls_backend: self.config.tls_backend,
        }
    }

    fn execute(&self, method: Method, save_path: Option<&Path>) -> crate::Result<Response> {
        let save_path = save_path.filter(|_| method != Method::HEAD);
        if let Some(path) = save_path {
            ensure_parent_directory(path)?;
        }

        let request = self.config.wire_request(&method)?;
        let options = self.transport_options();
        let redacted_uri = redact_uri_for_logs(&request.url);
        let retry_policy = self.config.retry_policy;
        let max_attempts = retry_policy.max_attempts();
        let proxy_text = options
            .proxy
            .as_ref()
            .map_or_else(|| NONE_TEXT.to_owned(), ToString::to_string);
        let auth_text = options
            .basic_auth
            .as_ref()
            .map_or(NONE_TEXT, |basic_auth| basic_auth.id());

        let mut attempt = 1;
        loop {
            info!(
                code = "attempt.start",
                method = %method,
                uri = %redacted_uri,
                attempt,
                max_attempts,
                proxy = %proxy_text,
                basic_auth = %auth_text,
                user_agent = %options.user_agent,
                "sending request"
            );
            let result = self.run_attempt(&request, &options, save_path, &redacted_uri);
            debug!(code = "attempt.closed", attempt, "connection released");

            let outcome = AttemptOutcome::from_result(&result, Response::status);
            match retry_policy.classify(attempt, &outcome) {
                AttemptVerdict::Success => return result,
                AttemptVerdict::TerminalFailure => {
                    if let Err(error) = &result {
                        warn!(
                            code = "attempt.failed",
                            error_code = error.code().as_str(),
                            attempt,
                            max_retries = retry_policy.max_retries_value(),
                            uri = %redacted_uri,
                            error = %error,
                            "request failed"
                        );
                    }
                    return result;
                }
                AttemptVerdict::RetryableFailure => {
                    let cause = match &result {
                        Ok(response) => {
                            format!("{} {}", response.status_code(), response.reason_phrase())
                        }
                        Err(error) => error.to_string(),
                    };
                    let interval = retry_policy.interval_value();
                    warn!(
                        code = "attempt.retry",
                        retry = attempt,
                        max_retries = retry_policy.max_retries_value(),
                        uri = %redacted_uri,
                        cause = %cause,
                        delay_ms = interval.as_millis() as u64,
                        "retrying request"
                    );
                    drop(result);
                    if !self.delay.wait(interval) {
                        return Err(Error::Interrupted {
                            attempt,
                            max_attempts,
                            method,
                            uri: redacted_uri,
                        });
                    }
                    attempt += 1;
                }
            }
        }
    }

    fn run_attempt(
        &self,
        request: &WireRequest,
        options: &TransportOptions,
        save_path: Option<&Path>,
        redacted_uri: &str,
    ) -> crate::Result<Response> {
        let mut transport_response = self.transport.send(request, options)?;
        let status = transport_response.status;
        debug!(
            code = "attempt.status",
            status = status.as_u16(),
            uri = %redacted_uri,
            "response received"
        );

        let sink = ResponseSink::select(&request.method, save_path, status);
        let output = sink.consume(&mut transport_response.body, |source| {
            body_read_error(source, &request.method, redacted_uri, options.timeout)
        })?;

        let header_charset = transport_response
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(content_type_charset);
        let headers = ResponseHeaders::from_header_map(&transport_response.headers);
        let (body, saved_to) = output.into_parts();

        Ok(Response::new(
            status,
            headers,
            body,
            saved_to,
            header_charset,
            self.config.response_charset.clone(),
        ))
    }
}
