//! Typed client for the SpamWatch API.
//!
//! # Design
//! `Client` holds the base URL, the bearer token and a transport, none of
//! which change after construction. Every endpoint method goes through one
//! dispatcher which is split in two halves, `build_request` and
//! `parse_response`, with the transport call in between. Callers that run
//! their own HTTP stack can use the two halves directly.
//!
//! Unit-returning endpoints never decode the body, so they succeed on any
//! status the mapping lets through.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{Config, DEFAULT_HOST};
use crate::error::{ApiError, Error};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{AddBan, Ban, CreateToken, Permission, Stats, Token, Version};

#[cfg(feature = "ureq")]
use crate::transport::UreqTransport;

#[derive(Debug, Clone)]
pub struct Client<T> {
    host: String,
    token: String,
    transport: T,
}

#[cfg(feature = "ureq")]
impl Client<UreqTransport> {
    /// Client for the production API over a default `ureq` agent.
    pub fn new(token: &str) -> Self {
        Self::with_transport(token, DEFAULT_HOST, UreqTransport::new())
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(token: &str, host: &str, transport: T) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            token: token.to_string(),
            transport,
        }
    }

    pub fn from_config(config: Config, transport: T) -> Self {
        Self::with_transport(&config.token, &config.host, transport)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Retrieve the API version.
    pub fn get_version(&self) -> Result<Version, Error> {
        self.request(HttpMethod::Get, "version", None::<&()>)
    }

    /// Retrieve basic statistics about the ban list.
    pub fn get_stats(&self) -> Result<Stats, Error> {
        self.request(HttpMethod::Get, "stats", None::<&()>)
    }

    /// Ban a user. Requires `Admin`.
    pub fn add_ban(&self, ban: &AddBan) -> Result<(), Error> {
        self.dispatch(HttpMethod::Post, "banlist", Some(ban))?;
        Ok(())
    }

    /// Lift a user's ban. Requires `Admin`.
    pub fn delete_ban(&self, user_id: i64) -> Result<(), Error> {
        self.dispatch(HttpMethod::Delete, &format!("banlist/{user_id}"), None::<&()>)?;
        Ok(())
    }

    /// Look up a ban. A user who is not banned yields `Ok(None)`; every other
    /// failure is returned as is.
    pub fn get_ban(&self, user_id: i64) -> Result<Option<Ban>, Error> {
        match self.request(HttpMethod::Get, &format!("banlist/{user_id}"), None::<&()>) {
            Ok(ban) => Ok(Some(ban)),
            Err(Error::Api(ApiError::NotFound { .. })) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Ids of every banned user.
    pub fn get_ban_ids(&self) -> Result<Vec<i64>, Error> {
        self.request(HttpMethod::Get, "banlist/all", None::<&()>)
    }

    /// Every ban record. Requires `Root`.
    pub fn get_bans(&self) -> Result<Vec<Ban>, Error> {
        self.request(HttpMethod::Get, "banlist", None::<&()>)
    }

    /// Every token. Retired tokens are dropped unless `include_retired` is
    /// set. Requires `Root`.
    pub fn get_tokens(&self, include_retired: bool) -> Result<Vec<Token>, Error> {
        let tokens = self.request(HttpMethod::Get, "tokens", None::<&()>)?;
        Ok(filter_retired(tokens, include_retired))
    }

    /// Issue a token for a user. Any API error yields `Ok(None)`.
    pub fn create_token(&self, user_id: i64, permission: Permission) -> Result<Option<Token>, Error> {
        let payload = CreateToken {
            user_id,
            permission,
        };
        self.request_or(HttpMethod::Post, "tokens", Some(&payload), None)
    }

    /// Fetch a token by id. Any API error yields `Ok(None)`.
    pub fn get_token(&self, token_id: i64) -> Result<Option<Token>, Error> {
        self.request_or(HttpMethod::Get, &format!("tokens/{token_id}"), None::<&()>, None)
    }

    /// Tokens issued to a user, or `None` when the lookup fails with an API
    /// error. Retired tokens are dropped unless `include_retired` is set.
    pub fn get_token_user(&self, user_id: i64, include_retired: bool) -> Result<Option<Vec<Token>>, Error> {
        let tokens: Option<Vec<Token>> = self.request_or(
            HttpMethod::Get,
            &format!("tokens/userid/{user_id}"),
            None::<&()>,
            None,
        )?;
        Ok(tokens.map(|tokens| filter_retired(tokens, include_retired)))
    }

    /// Retire a token. Requires `Root`.
    pub fn delete_token(&self, token_id: i64) -> Result<(), Error> {
        self.dispatch(HttpMethod::Delete, &format!("tokens/{token_id}"), None::<&()>)?;
        Ok(())
    }

    /// Build the request for `{host}/{path}`, authenticated with the bearer
    /// token. A body is serialized as JSON and sets the content type.
    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest, Error> {
        let mut headers = vec![("authorization".to_string(), format!("Bearer {}", self.token))];
        let body = match body {
            Some(body) => {
                let body = serde_json::to_string(body).map_err(Error::Serialization)?;
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(body)
            }
            None => None,
        };
        Ok(HttpRequest {
            method,
            url: format!("{}/{path}", self.host),
            headers,
            body,
        })
    }

    /// Map a response to its JSON body or to an `ApiError`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, Error> {
        let body = parse_body(&response.body);
        check_status(response, body, &self.token).map_err(|err| {
            warn!(status = err.status(), kind = ?err.kind(), "spamwatch request failed");
            Error::Api(err)
        })
    }

    fn dispatch<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, Error> {
        let request = self.build_request(method, path, body)?;
        debug!(%method, url = %request.url, "sending spamwatch request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, "received spamwatch response");
        self.parse_response(response)
    }

    fn request<R: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, Error> {
        let value = self.dispatch(method, path, body)?;
        serde_json::from_value(value).map_err(Error::Deserialization)
    }

    fn request_or<R: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        fallback: Option<R>,
    ) -> Result<Option<R>, Error> {
        or_fallback(self.request(method, path, body).map(Some), fallback)
    }
}

/// Substitute `fallback` for any error in the status taxonomy. Transport and
/// JSON failures still propagate.
pub fn or_fallback<R>(outcome: Result<R, Error>, fallback: R) -> Result<R, Error> {
    match outcome {
        Err(Error::Api(err)) => {
            debug!(kind = ?err.kind(), "substituting fallback for api error");
            Ok(fallback)
        }
        other => other,
    }
}

/// Map the documented status codes to `ApiError`. Any other status,
/// including unlisted 4xx/5xx codes, passes the body through.
pub fn check_status(response: HttpResponse, body: Value, token: &str) -> Result<Value, ApiError> {
    match response.status {
        400 => Err(ApiError::BadRequest { response, body }),
        401 => Err(ApiError::Unauthorized { response }),
        403 => Err(ApiError::Forbidden {
            response,
            token: token.to_string(),
        }),
        404 => Err(ApiError::NotFound { response }),
        429 => Err(ApiError::TooManyRequests { response, body }),
        500 => Err(ApiError::ServerError { response }),
        _ => Ok(body),
    }
}

/// Parse a response body, treating anything that is not JSON as `{}`.
fn parse_body(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::Object(Map::new()))
}

fn filter_retired(tokens: Vec<Token>, include_retired: bool) -> Vec<Token> {
    if include_retired {
        return tokens;
    }
    tokens.into_iter().filter(|token| !token.retired).collect()
}
