//! Household registry client.
//!
//! The registry has its own service login. The token it issues is cached by
//! the browser in the `wbbAuthToken` cookie and probed before reuse.

use axum::http::header::AUTHORIZATION;

use crate::backend::client::{UpstreamError, UpstreamResponse, execute, extract_token};
use crate::config::Config;
use crate::types::RegistryLoginRequest;

/// Registry token in use for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryToken {
    pub value: String,
    /// True when the token was freshly issued and must be stored again.
    pub refreshed: bool,
}

pub struct RegistryClient<'a> {
    http: &'a reqwest::Client,
    config: &'a Config,
    base_url: &'a str,
}

impl<'a> RegistryClient<'a> {
    /// `None` when no registry base URL is configured.
    pub fn new(http: &'a reqwest::Client, config: &'a Config) -> Option<Self> {
        let base_url = config.registry_base_url.as_deref()?;
        Some(Self {
            http,
            config,
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Whether the registry still accepts `token`.
    pub async fn probe(&self, token: &str) -> bool {
        let result = self
            .http
            .get(self.url("/auth/validate"))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await;

        match result {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::warn!("Registry token probe failed: {}", e);
                false
            }
        }
    }

    /// Obtain a fresh service token.
    pub async fn login(&self) -> Result<String, UpstreamError> {
        let body = RegistryLoginRequest {
            username: &self.config.registry_username,
            password: &self.config.registry_password,
        };
        let resp = execute(self.http.post(self.url("/auth/login")).json(&body)).await?;

        extract_token(&resp.body)
            .ok_or_else(|| UpstreamError::Decode("registry login returned no token".into()))
    }

    /// Reuse `cached` when the registry still accepts it, else log in again.
    pub async fn ensure_token(
        &self,
        cached: Option<String>,
    ) -> Result<RegistryToken, UpstreamError> {
        if let Some(token) = cached
            && self.probe(&token).await
        {
            return Ok(RegistryToken {
                value: token,
                refreshed: false,
            });
        }

        let value = self.login().await?;
        Ok(RegistryToken {
            value,
            refreshed: true,
        })
    }

    /// Look up a household.
    pub async fn household(
        &self,
        token: &str,
        query: &[(String, String)],
    ) -> Result<UpstreamResponse, UpstreamError> {
        execute(
            self.http
                .get(self.url("/household"))
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .query(query),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> Config {
        let mut config = Config::test_default();
        config.registry_base_url = Some(server.uri());
        config
    }

    #[test]
    fn test_unconfigured_registry() {
        let config = Config::test_default();
        let http = reqwest::Client::new();
        assert!(RegistryClient::new(&http, &config).is_none());
    }

    #[tokio::test]
    async fn test_cached_token_reused_when_valid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/validate"))
            .and(header("authorization", "Bearer cached"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "fresh"})))
            .expect(0)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let http = reqwest::Client::new();
        let client = RegistryClient::new(&http, &config).unwrap();

        let token = client.ensure_token(Some("cached".into())).await.unwrap();
        assert_eq!(
            token,
            RegistryToken {
                value: "cached".into(),
                refreshed: false
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_cached_token_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/validate"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"username": "registry-user", "password": "registry-pass"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"accessToken": "fresh"}})),
            )
            .mount(&server)
            .await;

        let config = config_for(&server);
        let http = reqwest::Client::new();
        let client = RegistryClient::new(&http, &config).unwrap();

        let token = client.ensure_token(Some("stale".into())).await.unwrap();
        assert_eq!(token.value, "fresh");
        assert!(token.refreshed);
    }

    #[tokio::test]
    async fn test_login_without_token_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let config = config_for(&server);
        let http = reqwest::Client::new();
        let client = RegistryClient::new(&http, &config).unwrap();

        assert!(matches!(
            client.ensure_token(None).await,
            Err(UpstreamError::Decode(_))
        ));
    }
}
