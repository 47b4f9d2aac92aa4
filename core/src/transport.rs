//! The seam between the client and an HTTP stack.
//!
//! A transport executes one `HttpRequest` and returns the raw `HttpResponse`
//! regardless of its status. Status interpretation belongs to the client.

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(HttpRequest) -> Result<HttpResponse, TransportError>,
{
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

#[cfg(feature = "ureq")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use ureq::{Agent, RequestBuilder};

    use super::Transport;
    use crate::error::TransportError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport backed by a shared `ureq::Agent`.
    ///
    /// The agent is built with `http_status_as_error(false)` so 4xx/5xx
    /// responses come back as data and reach the client's status mapping.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }

        /// Use a caller-configured agent. It must not treat HTTP status codes
        /// as errors.
        pub fn with_agent(agent: Agent) -> Self {
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
        for (key, value) in headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder
    }

    impl Transport for UreqTransport {
        fn execute(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
            let url = req.url.as_str();
            let result = match (req.method, req.body) {
                (HttpMethod::Get, _) => with_headers(self.agent.get(url), &req.headers).call(),
                (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), &req.headers).call(),
                (HttpMethod::Post, Some(body)) => {
                    with_headers(self.agent.post(url), &req.headers).send(body.as_bytes())
                }
                (HttpMethod::Post, None) => {
                    with_headers(self.agent.post(url), &req.headers).send_empty()
                }
            };
            let mut response = result.map_err(|e| TransportError(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(key, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (key.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| TransportError(e.to_string()))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
