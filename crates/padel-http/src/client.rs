//! REST client with bearer-token injection.

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use padel_core::error::{Error, InvalidInputError, MalformedResponse, ProtocolError, TransportError};
use padel_core::{AccessToken, BackendUrl, Result};

/// Error body returned by the backend on non-success statuses.
///
/// `message` is a string for most errors but a list of strings for
/// validation failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<serde_json::Value>,
}

impl ErrorBody {
    fn message_text(&self) -> Option<String> {
        match self.message.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(parts) => Some(
                parts
                    .iter()
                    .map(|p| p.as_str().map(str::to_string).unwrap_or_else(|| p.to_string()))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            other => Some(other.to_string()),
        }
    }
}

/// HTTP client for the backend's REST endpoints.
///
/// Every request carries the same headers; the bearer token, when
/// configured, is attached uniformly.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    backend: BackendUrl,
    authorization: Option<HeaderValue>,
}

impl RestClient {
    /// Create a client for the given backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the
    /// underlying HTTP client cannot be built.
    pub fn new(backend: BackendUrl, token: Option<&AccessToken>) -> Result<Self> {
        let authorization = token
            .map(|t| {
                let mut value = HeaderValue::from_str(&t.bearer()).map_err(|_| {
                    InvalidInputError::Other {
                        message: "access token contains invalid characters".to_string(),
                    }
                })?;
                value.set_sensitive(true);
                Ok::<_, Error>(value)
            })
            .transpose()?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("padel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            client,
            backend,
            authorization,
        })
    }

    pub fn backend(&self) -> &BackendUrl {
        &self.backend
    }

    pub fn is_authenticated(&self) -> bool {
        self.authorization.is_some()
    }

    #[instrument(skip(self), fields(backend = %self.backend))]
    pub async fn get<R>(&self, url: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        debug!(%url, "GET");
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(transport_error)?;

        self.handle_response(url, response).await
    }

    #[instrument(skip(self, body), fields(backend = %self.backend))]
    pub async fn post<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(%url, "POST");
        let response = self
            .request(Method::POST, url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        self.handle_response(url, response).await
    }

    #[instrument(skip(self, body), fields(backend = %self.backend))]
    pub async fn patch<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(%url, "PATCH");
        let response = self
            .request(Method::PATCH, url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        self.handle_response(url, response).await
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        match &self.authorization {
            Some(value) => builder.header(AUTHORIZATION, value.clone()),
            None => builder,
        }
    }

    async fn handle_response<R: DeserializeOwned>(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<R> {
        let status = response.status();
        trace!(status = %status, "response");

        if !status.is_success() {
            return Err(Error::Protocol(parse_error_response(response).await));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| MalformedResponse::new(url, e).into())
    }
}

async fn parse_error_response(response: reqwest::Response) -> ProtocolError {
    let status = response.status().as_u16();

    match response.json::<ErrorBody>().await {
        Ok(body) => {
            let message = body.message_text();
            ProtocolError::new(status, body.error, message)
        }
        Err(_) => ProtocolError::new(status, None, None),
    }
}

pub(crate) fn transport_error(err: reqwest::Error) -> Error {
    let transport = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(transport)
}
