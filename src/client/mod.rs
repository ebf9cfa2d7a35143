use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::session::SessionStore;

/// Error body shape the backend uses for every rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    validation_errors: Option<HashMap<String, String>>,
}

/// Request pipeline over the banking backend.
///
/// Every dispatch reads the current token from the session store at the
/// moment the request is built, never a snapshot taken earlier. A 401/403
/// response clears the session as a side effect and still propagates the
/// error to the caller. No retries, no request queueing.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(session: Arc<SessionStore>) -> Result<Self, ClientError> {
        let api = &crate::config::config().api;
        Self::with_base_url(&api.base_url, api.timeout_secs, session)
    }

    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        session: Arc<SessionStore>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let res = self.dispatch(self.request(Method::GET, path)).await?;
        Ok(res.json().await?)
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let res = self
            .dispatch(self.request(Method::POST, path).json(body))
            .await?;
        Ok(res.json().await?)
    }

    /// POST with an empty body and query-string parameters, matching the
    /// backend's deposit/withdraw endpoints.
    pub async fn post_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let res = self
            .dispatch(self.request(Method::POST, path).query(query))
            .await?;
        Ok(res.json().await?)
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let res = self
            .dispatch(self.request(Method::PUT, path).json(body))
            .await?;
        Ok(res.json().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.dispatch(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "dispatching request");
        self.http.request(method, url)
    }

    /// Outbound stage: attach the current bearer token if one exists.
    /// Inbound stage: pass 2xx through; on 401/403 force a logout before
    /// propagating; propagate every other status unchanged.
    async fn dispatch(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let builder = match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let res = builder.send().await?;
        let status = res.status();

        if status.is_success() {
            return Ok(res);
        }

        let message = error_message(res).await;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(%status, "authorization failure, clearing session");
            // The storage write must not mask the authorization error
            if let Err(e) = self.session.logout() {
                tracing::warn!("failed to clear persisted session: {e}");
            }
            return Err(ClientError::Unauthorized { status, message });
        }

        Err(ClientError::Api { status, message })
    }
}

/// Backend-provided message when present, else a generic fallback.
async fn error_message(res: Response) -> String {
    res.json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| "The request could not be completed".to_string())
}
