use crate::types::{AccountIdentity, FetchConfig, PosterError, Publisher, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

const VERIFY_CREDENTIALS_PATH: &str = "api/v1/accounts/verify_credentials";
const STATUSES_PATH: &str = "api/v1/statuses";

#[derive(Debug, Deserialize)]
struct Account {
    id: String,
    username: String,
    acct: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}

/// Publisher for one account on a Mastodon-compatible instance.
pub struct MastodonClient {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl MastodonClient {
    /// `instance_url` may omit the scheme, in which case https is assumed.
    pub fn new(instance_url: &str, access_token: &str, config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url(instance_url)?,
            access_token: access_token.to_string(),
        })
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| body.chars().take(200).collect());

        Err(PosterError::HttpStatus {
            status: status.as_u16(),
            body: message,
        })
    }
}

fn base_url(instance_url: &str) -> Result<Url> {
    let trimmed = instance_url.trim();
    if trimmed.is_empty() {
        return Err(PosterError::Config("instance URL is empty".to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut url = Url::parse(&with_scheme)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[async_trait]
impl Publisher for MastodonClient {
    async fn authenticate(&self) -> anyhow::Result<AccountIdentity> {
        let url = self.base_url.join(VERIFY_CREDENTIALS_PATH)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let account: Account = Self::check(response).await?.json().await?;

        Ok(AccountIdentity {
            id: account.id,
            username: account.username,
            acct: account.acct,
        })
    }

    async fn publish(&self, content: &str) -> anyhow::Result<()> {
        let url = self.base_url.join(STATUSES_PATH)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .form(&[("status", content)])
            .send()
            .await?;

        let status: Status = Self::check(response).await?.json().await?;
        debug!(
            "Created status {} ({})",
            status.id,
            status.url.as_deref().unwrap_or("no url")
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const ACCOUNT: &str = r#"{"id":"109","username":"bot","acct":"bot","display_name":"Feed bot"}"#;

    fn client(server: &mockito::Server) -> MastodonClient {
        MastodonClient::new(&server.url(), "secret-token", &FetchConfig::default()).unwrap()
    }

    #[test]
    fn instance_url_gets_scheme_and_trailing_slash() {
        assert_eq!(
            base_url("mastodon.social").unwrap().as_str(),
            "https://mastodon.social/"
        );
        assert_eq!(
            base_url("https://example.org/masto").unwrap().as_str(),
            "https://example.org/masto/"
        );
        assert!(matches!(base_url("  "), Err(PosterError::Config(_))));
    }

    #[tokio::test]
    async fn authenticate_returns_account_identity() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/accounts/verify_credentials")
            .match_header("authorization", "Bearer secret-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(ACCOUNT)
            .create_async()
            .await;

        let identity = client(&server).authenticate().await.unwrap();

        assert_eq!(
            identity,
            AccountIdentity {
                id: "109".to_string(),
                username: "bot".to_string(),
                acct: "bot".to_string(),
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_token_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/accounts/verify_credentials")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"The access token is invalid"}"#)
            .create_async()
            .await;

        let error = client(&server).authenticate().await.unwrap_err();

        assert!(error.to_string().contains("The access token is invalid"));
    }

    #[tokio::test]
    async fn publish_posts_status_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/statuses")
            .match_header("authorization", "Bearer secret-token")
            .match_body(Matcher::UrlEncoded(
                "status".to_string(),
                "Hello\n\nhttps://example.com #café".to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"1","url":"https://example.social/@bot/1"}"#)
            .create_async()
            .await;

        client(&server)
            .publish("Hello\n\nhttps://example.com #café")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn publish_failure_carries_the_cause() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/statuses")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Validation failed: Text character limit of 500 exceeded"}"#)
            .create_async()
            .await;

        let error = client(&server).publish("too long").await.unwrap_err();

        assert!(error.to_string().contains("character limit"));
    }
}
