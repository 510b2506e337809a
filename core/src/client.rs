//! Shared HTTP client for the TrueShift API.
//!
//! # Design
//! `ApiClient` holds the base URL, the shared `Session`, and a `Transport`.
//! Every call is split into `build_request` (pure, captures the bearer header
//! at dispatch time) and `parse_response` (pure, normalizes status codes),
//! with `request` doing the round-trip in between. Payloads are opaque
//! `serde_json::Value`s; nothing is checked against a schema.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::session::Session;
use crate::transport::Transport;

pub struct ApiClient<T> {
    base_url: String,
    session: Arc<Session>,
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(base_url: &str, session: Arc<Session>, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Builds a request for `path` relative to the base URL.
    ///
    /// The `Authorization` header reflects the session at the moment of the
    /// call. It is attached whenever a token is set and omitted otherwise,
    /// regardless of whether the endpoint is marked as requiring auth.
    pub fn build_request<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        query: &[(&str, &str)],
    ) -> Result<HttpRequest, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut url = format!("{}{}", self.base_url, path);
        if !query.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query)
                .finish();
            url.push('?');
            url.push_str(&encoded);
        }

        let mut headers = Vec::new();
        let body = match body {
            Some(body) => {
                let json = serde_json::to_string(body)
                    .map_err(|e| ApiError::SerializationError(e.to_string()))?;
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(json)
            }
            None => None,
        };
        if let Some(credential) = self.session.authorization() {
            headers.push(("authorization".to_string(), credential));
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Returns the payload of a 2xx response, or `HttpError` otherwise.
    ///
    /// Bodies that are not JSON are returned as a JSON string, so a server
    /// answering with a bare token yields `"<token>"`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        if response.is_success() {
            return Ok(body_value(&response.body).unwrap_or_else(|| Value::String(String::new())));
        }
        Err(ApiError::HttpError {
            status: response.status,
            body: body_value(&response.body),
        })
    }

    pub async fn request<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        query: &[(&str, &str)],
    ) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let request = self.build_request(method, path, body, query)?;
        debug!(
            %method,
            url = %request.url,
            authenticated = request.header("authorization").is_some(),
            "dispatching"
        );
        let response = self.transport.execute(request).await?;
        let status = response.status;
        self.parse_response(response).inspect_err(|e| {
            warn!(%method, path, status, error = %e, "request failed");
        })
    }

    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request::<Value>(HttpMethod::Get, path, None, &[]).await
    }

    pub async fn post_json<B>(&self, path: &str, body: &B) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.request(HttpMethod::Post, path, Some(body), &[]).await
    }

    /// POST with an empty body and the given query parameters.
    pub async fn post_query(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.request::<Value>(HttpMethod::Post, path, None, query)
            .await
    }
}

fn body_value(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
}
