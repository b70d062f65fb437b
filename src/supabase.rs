//! Shared HTTP transport for the hosted Supabase backend.
//!
//! The auth, table and storage clients all go through one [`SupabaseClient`] so
//! that a signed-in user's access token is attached to every request.

use reqwest::{Client, Method, RequestBuilder, Response};
use tokio::sync::RwLock;

use crate::config::SupabaseConfig;

pub struct SupabaseClient {
    http: Client,
    url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!("remix-competition/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: RwLock::new(None),
        })
    }

    /// Project base URL, without trailing slash
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.url)
    }

    /// Start a request carrying the API key and the user's token (or the anon key).
    pub async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let token = self
            .access_token
            .read()
            .await
            .clone()
            .unwrap_or_else(|| self.anon_key.clone());

        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    pub async fn access_token(&self) -> Option<String> {
        self.access_token.read().await.clone()
    }

    pub async fn set_access_token(&self, token: Option<String>) {
        let mut lock = self.access_token.write().await;
        *lock = token;
    }
}

/// Consume a failed response and extract the platform's error message.
pub async fn error_message(resp: Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    parse_error_message(&body).unwrap_or_else(|| format!("Request failed ({status})"))
}

/// GoTrue, PostgREST and Storage each name the message field differently.
fn parse_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|field| value.get(field).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::parse_error_message;

    #[test]
    fn reads_postgrest_message() {
        let body = r#"{"code":"23505","details":null,"hint":null,"message":"duplicate key"}"#;
        assert_eq!(parse_error_message(body).as_deref(), Some("duplicate key"));
    }

    #[test]
    fn reads_gotrue_error_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            parse_error_message(body).as_deref(),
            Some("Invalid login credentials")
        );
    }

    #[test]
    fn reads_gotrue_msg() {
        let body = r#"{"code":422,"msg":"User already registered"}"#;
        assert_eq!(
            parse_error_message(body).as_deref(),
            Some("User already registered")
        );
    }

    #[test]
    fn ignores_non_json_bodies() {
        assert_eq!(parse_error_message("<html>bad gateway</html>"), None);
    }
}
