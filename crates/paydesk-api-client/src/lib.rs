//! Shared HTTP client for the paydesk backend.
//!
//! Provides a minimal client with optional bearer auth, generic GET / multipart
//! POST / DELETE helpers, paginated table fetches, and the period-scoped
//! document operations. The CLI uses this client directly.

pub mod blob;
pub mod browser;
pub mod documents;

use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use paydesk_core::models::Page;
use paydesk_core::{ClientConfig, SessionContext, TableQuery};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// No credentials; the backend decides what that means.
    Anonymous,
}

/// HTTP client for the paydesk API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_prefix: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: String, api_prefix: &str, auth: Auth, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_prefix: api_prefix.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Token comes from the session; a missing token is not an error, requests
    /// simply go out without credentials.
    pub fn from_config(config: &ClientConfig, session: &SessionContext) -> Result<Self> {
        let auth = match &session.token {
            Some(token) => Auth::Bearer(token.clone()),
            None => Auth::Anonymous,
        };
        Self::new(
            config.api_url.clone(),
            &config.api_prefix(),
            auth,
            config.http_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Versioned API path: `api_path("/employees")` -> `/api/v1/employees`.
    pub fn api_path(&self, path: &str) -> String {
        format!("{}{}", self.api_prefix, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Anonymous => request,
        }
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.build_url(path);
        let mut request = self.apply_auth(self.client.get(&url));

        if !query.is_empty() {
            request = request.query(query);
        }

        tracing::debug!(url = %url, "GET");
        let response = request.send().await.context("Failed to send request")?;
        let response = ensure_success(response).await?;

        let body: T = response
            .json()
            .await
            .context("Failed to parse response as JSON")?;

        Ok(body)
    }

    /// GET raw bytes together with the response content type.
    pub async fn get_bytes(&self, path: &str) -> Result<(Bytes, Option<String>)> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.get(&url));

        tracing::debug!(url = %url, "GET (bytes)");
        let response = request.send().await.context("Failed to send request")?;
        let response = ensure_success(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .context("Failed to read response body")?;

        Ok((body, content_type))
    }

    /// POST multipart form. The response body is ignored.
    pub async fn post_multipart(&self, path: &str, form: reqwest::multipart::Form) -> Result<()> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).multipart(form));

        tracing::debug!(url = %url, "POST (multipart)");
        let response = request.send().await.context("Failed to send request")?;
        ensure_success(response).await?;

        Ok(())
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.delete(&url));

        tracing::debug!(url = %url, "DELETE");
        let response = request.send().await.context("Failed to send request")?;
        ensure_success(response).await?;

        Ok(())
    }

    /// Fetch one page of a filterable list, e.g. `fetch_page("employees", ..)`.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &TableQuery,
    ) -> Result<Page<T>> {
        let path = self.api_path(&format!("/{}", resource.trim_start_matches('/')));
        self.get(&path, &query.to_query_pairs()).await
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(anyhow::anyhow!(
        "API request failed with status {}: {}",
        status,
        error_text
    ))
}

pub use blob::{BlobUrl, BlobUrlRegistry};
pub use browser::DocumentBrowser;
pub use documents::{DocumentService, ViewedDocument};


#[cfg(test)]
mod tests {
    use super::test_support::client_for;
    use super::*;
    use mockito::Matcher;
    use paydesk_core::{Filter, FilterOperator, FilterValue};

    #[derive(Debug, serde::Deserialize)]
    struct Employee {
        name: String,
    }

    #[test]
    fn test_paths() {
        let client = ApiClient::new(
            "https://hr.example.com/".to_string(),
            "/api/v1/",
            Auth::Anonymous,
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url(), "https://hr.example.com");
        assert_eq!(client.api_path("/employees"), "/api/v1/employees");
        assert_eq!(
            client.build_url(&client.api_path("/employees")),
            "https://hr.example.com/api/v1/employees"
        );
    }

    #[tokio::test]
    async fn test_fetch_page_sends_filters_and_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/employees")
            .match_header("authorization", "Bearer secret")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "0".into()),
                Matcher::UrlEncoded("size".into(), "20".into()),
                Matcher::UrlEncoded("filter".into(), "Status:eq:Active".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content":[{"name":"Ada"}],"totalElements":1}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let query = TableQuery {
            filters: vec![Filter::new(
                "Status",
                FilterOperator::Is,
                FilterValue::scalar("Active"),
            )],
            ..TableQuery::default()
        };
        let page: Page<Employee> = client.fetch_page("employees", &query).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.content[0].name, "Ada");
        assert_eq!(page.page_count(query.size), 1);
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/api/v1/candidates/9")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .delete(&client.api_path("/candidates/9"))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("403"), "{message}");
        assert!(message.contains("forbidden"), "{message}");
    }

    #[tokio::test]
    async fn test_anonymous_client_sends_no_authorization() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/ping")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("true")
            .create_async()
            .await;

        let client = ApiClient::new(
            server.url(),
            "/api/v1",
            Auth::Anonymous,
            Duration::from_secs(5),
        )
        .unwrap();
        let ok: bool = client.get(&client.api_path("/ping"), &[]).await.unwrap();

        mock.assert_async().await;
        assert!(ok);
    }
}
