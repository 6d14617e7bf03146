//! HTTP client for the TerraConsole REST API.
//!
//! Every endpoint funnels through [`ApiClient::request`], which attaches the
//! bearer token from the injected [`TokenStore`], turns a 401 into a forced
//! logout, and maps other non-2xx bodies to [`ApiError::Api`].

mod auth;
mod orgs;
mod projects;
mod runs;
mod state;
mod terraform;
mod variables;
mod workspaces;

pub use runs::RunsApi;

use crate::config::ConsoleConfig;
use crate::error::{ApiError, ApiResult, GENERIC_FAILURE};
use crate::nav::{Navigator, Route};
use crate::session::TokenStore;
use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    nav: Navigator,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(cfg: &ConsoleConfig, tokens: Arc<dyn TokenStore>, nav: Navigator) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("terraconsole-cli/{}", env!("CARGO_PKG_VERSION")))
            .timeout(cfg.request_timeout)
            .build()
            .context("build http client")?;
        Ok(Self::with_http(http, &cfg.api_url, tokens, nav))
    }

    pub fn with_http(
        http: reqwest::Client,
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
        nav: Navigator,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            nav,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, path, "api request");

        let mut req = self
            .http
            .request(method.clone(), url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        // Read on every request: login/logout elsewhere must take effect immediately.
        if let Some(token) = self.tokens.load() {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        self.handle_response(&method, path, status, &bytes)
    }

    /// Apply the response contract to a status and raw body.
    pub(crate) fn handle_response<T: DeserializeOwned>(
        &self,
        method: &Method,
        path: &str,
        status: StatusCode,
        body: &[u8],
    ) -> ApiResult<T> {
        if status == StatusCode::UNAUTHORIZED {
            tracing::info!(%method, path, "401 from api, clearing session token");
            self.tokens.clear();
            self.nav.go(Route::Login);
            return Err(ApiError::Unauthorized {
                message: error_message(body),
            });
        }
        if !status.is_success() {
            let message = error_message(body);
            tracing::warn!(%method, path, status = status.as_u16(), %message, "api call failed");
            return Err(ApiError::Api { status, message });
        }
        Ok(serde_json::from_slice(body)?)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    /// GET a collection. The server encodes an empty collection as `null`.
    pub(crate) async fn get_list<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let items: Option<Vec<T>> = self.get(path).await?;
        Ok(items.unwrap_or_default())
    }

    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request::<T, ()>(Method::POST, path, None).await
    }

    pub(crate) async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// `body.error` when present, otherwise the generic fallback.
fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::Message;
    use crate::session::MemoryTokenStore;

    pub(crate) fn client_with_token(token: Option<&str>) -> (ApiClient, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::new(token.map(str::to_string)));
        let client = ApiClient::with_http(
            reqwest::Client::new(),
            "http://127.0.0.1:9/api/",
            store.clone(),
            Navigator::new(Route::Dashboard),
        );
        (client, store)
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let (client, _) = client_with_token(None);
        assert_eq!(client.base_url(), "http://127.0.0.1:9/api");
    }

    #[test]
    fn unauthorized_clears_token_and_routes_to_login() {
        for path in ["/runs/r-1", "/organizations", "/workspaces/ws-1/state"] {
            let (client, store) = client_with_token(Some("tok"));
            let res: ApiResult<Message> = client.handle_response(
                &Method::GET,
                path,
                StatusCode::UNAUTHORIZED,
                br#"{"error":"Unauthorized"}"#,
            );
            assert!(matches!(res, Err(ApiError::Unauthorized { .. })));
            assert_eq!(store.load(), None, "{path}");
            assert_eq!(client.navigator().current(), Route::Login);
            assert_eq!(client.navigator().current().path(), "/login");
        }
    }

    #[test]
    fn non_success_surfaces_error_field() {
        let (client, store) = client_with_token(Some("tok"));
        let res: ApiResult<Message> = client.handle_response(
            &Method::POST,
            "/workspaces/ws-1/runs",
            StatusCode::CONFLICT,
            br#"{"error":"Workspace is locked"}"#,
        );
        match res {
            Err(ApiError::Api { status, message }) => {
                assert_eq!(status, StatusCode::CONFLICT);
                assert_eq!(message, "Workspace is locked");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(store.load().as_deref(), Some("tok"));
        assert_eq!(client.navigator().current(), Route::Dashboard);
    }

    #[test]
    fn non_success_without_error_field_uses_fallback() {
        let (client, _) = client_with_token(None);
        let bodies: [&[u8]; 3] = [b"<html>bad gateway</html>", br#"{"message":"x"}"#, b""];
        for body in bodies {
            let res: ApiResult<Message> =
                client.handle_response(&Method::GET, "/x", StatusCode::BAD_GATEWAY, body);
            assert_eq!(res.unwrap_err().user_message(), GENERIC_FAILURE);
        }
    }

    #[test]
    fn success_body_that_does_not_parse_is_a_decode_error() {
        let (client, _) = client_with_token(None);
        let res: ApiResult<Message> =
            client.handle_response(&Method::GET, "/x", StatusCode::OK, b"not json");
        assert!(matches!(res, Err(ApiError::Decode(_))));
    }

    #[test]
    fn null_collections_decode_as_none() {
        let (client, _) = client_with_token(None);
        let res: Option<Vec<Message>> = client
            .handle_response(&Method::GET, "/x", StatusCode::OK, b"null")
            .unwrap();
        assert!(res.unwrap_or_default().is_empty());
    }
}
