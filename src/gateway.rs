//! The single authenticated request primitive for the external API.
//!
//! Every API call in the crate funnels through [`ApiGateway::send`], which
//! attaches the bearer token, issues the call over an [`ApiTransport`], and
//! classifies the outcome into the crate's error taxonomy. A 401 here is the
//! only thing besides an explicit revoke that resets the session.

use crate::error::{GatewayError, GatewayResult};
use crate::session::SessionState;
use async_trait::async_trait;
use http::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Base URL of the external REST API.
pub const API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One outbound HTTP exchange, with authentication already attached.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub bearer: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

/// The wire seam under the gateway. Production uses [`HttpTransport`];
/// tests script responses and count calls.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> GatewayResult<ApiResponse>;
}

/// Transport over a shared `reqwest` client with a request timeout.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> GatewayResult<ApiResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .header("Authorization", format!("Bearer {}", request.bearer));

        if let Some(body) = &request.body {
            builder = builder
                .header("Content-Type", "application/json")
                .json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        // Error pages and empty DELETE responses need not be JSON.
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok(ApiResponse { status, body })
    }
}

/// Issues authenticated calls and classifies their outcomes.
#[derive(Clone)]
pub struct ApiGateway {
    transport: Arc<dyn ApiTransport>,
    session: SessionState,
    base_url: String,
}

impl ApiGateway {
    pub fn new(transport: Arc<dyn ApiTransport>, session: SessionState) -> Self {
        Self::with_base_url(transport, session, API_BASE_URL)
    }

    pub fn with_base_url(
        transport: Arc<dyn ApiTransport>,
        session: SessionState,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            session,
            base_url: base_url.into(),
        }
    }

    /// Authenticated read against `endpoint`.
    pub async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> GatewayResult<Value> {
        self.send(Method::GET, endpoint, params, None).await
    }

    /// Authenticated call against `endpoint` with an optional JSON body.
    ///
    /// Outcomes: 2xx yields the parsed body; 401 resets the session and
    /// yields [`GatewayError::AuthExpired`]; any other status yields
    /// [`GatewayError::Api`] with no retry. With no token held, the call
    /// fails [`GatewayError::AuthRequired`] before any I/O.
    pub async fn send(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, String)],
        body: Option<Value>,
    ) -> GatewayResult<Value> {
        let Some(bearer) = self.session.bearer().await else {
            return Err(GatewayError::AuthRequired);
        };

        let url = self.build_url(endpoint, params);
        tracing::trace!(%method, endpoint, "issuing API request");

        let response = self
            .transport
            .execute(ApiRequest {
                method,
                url,
                bearer,
                body,
            })
            .await?;

        match response.status {
            status if (200..300).contains(&status) => Ok(response.body),
            401 => {
                tracing::warn!(endpoint, "API rejected bearer token, resetting session");
                self.session.invalidate().await;
                Err(GatewayError::AuthExpired)
            }
            status => {
                tracing::debug!(endpoint, status, "API request failed");
                Err(GatewayError::Api { status })
            }
        }
    }

    fn build_url(&self, endpoint: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}/{}", self.base_url, endpoint);
        if !params.is_empty() {
            let query: String = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
                .finish();
            url.push('?');
            url.push_str(&query);
        }
        url
    }
}
