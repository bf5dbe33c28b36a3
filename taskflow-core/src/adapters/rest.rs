//! REST backend client
//!
//! Talks to the hosted auth/data service over its two HTTP surfaces: a
//! GoTrue-style auth API (`/auth/v1/...`) and a PostgREST-style data API
//! (`/rest/v1/...`). The service scopes account rows to the bearer token,
//! so directory queries carry the current access token.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use url::Url;
use uuid::Uuid;

use crate::domain::{Account, AccountType, Session, User};

/// Low-level REST API client
#[derive(Debug)]
pub struct RestClient {
    client: Client,
    base_url: String,
    api_key: String,
    /// Client-side copy of the current session (the service is stateless;
    /// tokens live with the client, like a browser's local storage)
    session: Mutex<Option<Session>>,
}

/// Token grant response from the auth API
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserDto,
}

/// User object from the auth API
#[derive(Debug, Deserialize)]
struct UserDto {
    id: Uuid,
    email: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    user_metadata: HashMap<String, JsonValue>,
}

/// Account row from the data API
#[derive(Debug, Deserialize)]
struct AccountDto {
    id: Uuid,
    slug: String,
    name: String,
    account_type: AccountType,
    #[serde(default)]
    account_info: HashMap<String, JsonValue>,
    #[serde(default)]
    account_settings: HashMap<String, JsonValue>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Error body the auth API returns on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl RestClient {
    /// Create a new client for the given service URL and publishable key
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).context("Invalid backend URL")?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            anyhow::bail!("Backend URL must use http or https");
        }
        if api_key.trim().is_empty() {
            anyhow::bail!("Backend API key must not be empty");
        }

        let client = Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            session: Mutex::new(None),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1{}", self.base_url, path)
    }

    fn stored_session(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }

    fn store_session(&self, session: Option<Session>) {
        *self.session.lock().unwrap() = session;
    }

    fn access_token(&self) -> Result<String> {
        self.stored_session()
            .map(|s| s.access_token)
            .context("Not signed in")
    }

    /// Read the current session without a network round trip
    pub fn current_session(&self) -> Option<Session> {
        let session = self.stored_session()?;
        if session.is_expired(Utc::now()) {
            None
        } else {
            Some(session)
        }
    }

    /// Exchange credentials for a session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}?grant_type=password", self.auth_url("/token"));
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(map_request_error)?;

        let response = check_response(response).await?;
        let data: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;

        let session = map_session(data);
        self.store_session(Some(session.clone()));
        Ok(session)
    }

    /// Register a new user; no session is issued until email confirmation
    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<User> {
        let response = self
            .client
            .post(self.auth_url("/signup"))
            .header("apikey", &self.api_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": name },
            }))
            .send()
            .await
            .map_err(map_request_error)?;

        let response = check_response(response).await?;
        let data: UserDto = response
            .json()
            .await
            .context("Failed to parse signup response")?;
        Ok(map_user(data))
    }

    /// Redeem the refresh token for a new session
    pub async fn refresh_session(&self) -> Result<Option<Session>> {
        let refresh_token = match self.stored_session().and_then(|s| s.refresh_token) {
            Some(token) => token,
            None => return Ok(None),
        };

        let url = format!("{}?grant_type=refresh_token", self.auth_url("/token"));
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(map_request_error)?;

        // A rejected refresh token means the session is gone, not an error
        if response.status().as_u16() == 401 || response.status().as_u16() == 400 {
            self.store_session(None);
            return Ok(None);
        }

        let response = check_response(response).await?;
        let data: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;
        let session = map_session(data);
        self.store_session(Some(session.clone()));
        Ok(Some(session))
    }

    /// Invalidate the session server-side and locally
    pub async fn sign_out(&self) -> Result<()> {
        if let Ok(token) = self.access_token() {
            let response = self
                .client
                .post(self.auth_url("/logout"))
                .header("apikey", &self.api_key)
                .bearer_auth(token)
                .send()
                .await
                .map_err(map_request_error)?;
            // Local state clears regardless; a 401 here just means the
            // token was already dead
            let _ = response;
        }
        self.store_session(None);
        Ok(())
    }

    /// List account rows visible to the current user
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let url = format!(
            "{}?select=*&order=account_type.desc,created_at.asc",
            self.rest_url("/accounts")
        );
        let rows: Vec<AccountDto> = self.get_json(&url).await?;
        Ok(rows.into_iter().map(map_account).collect())
    }

    /// Fetch the personal workspace row
    pub async fn get_personal_workspace(&self) -> Result<Option<Account>> {
        let url = format!(
            "{}?select=*&account_type=eq.personal&limit=1",
            self.rest_url("/accounts")
        );
        let rows: Vec<AccountDto> = self.get_json(&url).await?;
        Ok(rows.into_iter().next().map(map_account))
    }

    /// Fetch a team workspace row by slug
    pub async fn get_team_workspace(&self, slug: &str) -> Result<Option<Account>> {
        let url = format!(
            "{}?select=*&account_type=eq.team&slug=eq.{}&limit=1",
            self.rest_url("/accounts"),
            slug
        );
        let rows: Vec<AccountDto> = self.get_json(&url).await?;
        Ok(rows.into_iter().next().map(map_account))
    }

    /// Update mutable account fields, returning the stored row
    pub async fn update_account(&self, account: &Account) -> Result<Account> {
        let url = format!("{}?id=eq.{}", self.rest_url("/accounts"), account.id);
        let response = self
            .client
            .patch(&url)
            .header("apikey", &self.api_key)
            .header("Prefer", "return=representation")
            .bearer_auth(self.access_token()?)
            .json(&json!({
                "name": account.name,
                "slug": account.slug,
                "account_info": account.account_info,
                "account_settings": account.account_settings,
            }))
            .send()
            .await
            .map_err(map_request_error)?;

        let response = check_response(response).await?;
        let rows: Vec<AccountDto> = response
            .json()
            .await
            .context("Failed to parse account response")?;
        rows.into_iter()
            .next()
            .map(map_account)
            .context("Account update returned no rows")
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(self.access_token()?)
            .send()
            .await
            .map_err(map_request_error)?;

        let response = check_response(response).await?;
        response.json().await.context("Failed to parse response")
    }
}

fn map_user(dto: UserDto) -> User {
    User {
        id: dto.id,
        email: dto.email,
        created_at: dto.created_at,
        confirmed_at: dto.email_confirmed_at,
        metadata: dto.user_metadata,
    }
}

fn map_session(dto: TokenResponse) -> Session {
    // Expiry priority: explicit expires_at, then expires_in, then the
    // JWT's own exp claim
    let expires_at = dto
        .expires_at
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .or_else(|| dto.expires_in.map(|s| Utc::now() + chrono::Duration::seconds(s)))
        .or_else(|| decode_jwt_expiry(&dto.access_token));

    Session {
        access_token: dto.access_token,
        refresh_token: dto.refresh_token,
        expires_at,
        user: map_user(dto.user),
    }
}

fn map_account(dto: AccountDto) -> Account {
    Account {
        id: dto.id,
        slug: dto.slug,
        name: dto.name,
        account_type: dto.account_type,
        account_info: dto.account_info,
        account_settings: dto.account_settings,
        created_at: dto.created_at,
        updated_at: dto.updated_at,
    }
}

/// Pull the `exp` claim out of a JWT access token
fn decode_jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .ok()?;
    let claims: JsonValue = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    Utc.timestamp_opt(exp, 0).single()
}

/// Map request errors to user-friendly messages
fn map_request_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        anyhow::anyhow!("Connection timed out after 30 seconds")
    } else if error.is_connect() {
        anyhow::anyhow!("Unable to reach the Task Flow service")
    } else {
        anyhow::anyhow!("Request failed: {}", error)
    }
}

/// Check response status and surface the service's error message
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|b| b.msg.or(b.message).or(b.error_description));

    match status.as_u16() {
        401 => anyhow::bail!(
            "{}",
            detail.unwrap_or_else(|| "Session expired or invalid. Please sign in again.".into())
        ),
        403 => anyhow::bail!(
            "{}",
            detail.unwrap_or_else(|| "You don't have access to this resource.".into())
        ),
        404 => anyhow::bail!("{}", detail.unwrap_or_else(|| "Not found.".into())),
        422 | 400 => anyhow::bail!("{}", detail.unwrap_or_else(|| "Invalid request.".into())),
        429 => anyhow::bail!("Too many requests. Please wait a moment and try again."),
        code => anyhow::bail!("Service error: HTTP {}", code),
    }
}

// =============================================================================
// RestBackend - implements the AuthProvider and WorkspaceDirectory ports
// =============================================================================

use async_trait::async_trait;

use crate::domain::result::{Error as DomainError, Result as DomainResult};
use crate::ports::{AuthProvider, WorkspaceDirectory};

/// REST adapter over the hosted service
pub struct RestBackend {
    client: RestClient,
}

impl RestBackend {
    pub fn new(base_url: &str, api_key: &str) -> DomainResult<Self> {
        let client = RestClient::new(base_url, api_key)
            .map_err(|e| DomainError::Config(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AuthProvider for RestBackend {
    fn name(&self) -> &str {
        "rest"
    }

    async fn get_session(&self) -> DomainResult<Option<Session>> {
        // Stored session first; fall back to a refresh when it expired
        if let Some(session) = self.client.current_session() {
            return Ok(Some(session));
        }
        self.client
            .refresh_session()
            .await
            .map_err(|e| DomainError::service(e.to_string()))
    }

    async fn refresh_session(&self) -> DomainResult<Option<Session>> {
        self.client
            .refresh_session()
            .await
            .map_err(|e| DomainError::service(e.to_string()))
    }

    async fn sign_up(&self, email: &str, password: &str, name: &str) -> DomainResult<User> {
        self.client
            .sign_up(email, password, name)
            .await
            .map_err(|e| DomainError::auth(e.to_string()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Session> {
        self.client
            .sign_in(email, password)
            .await
            .map_err(|e| DomainError::auth(e.to_string()))
    }

    async fn sign_out(&self) -> DomainResult<()> {
        self.client
            .sign_out()
            .await
            .map_err(|e| DomainError::service(e.to_string()))
    }
}

#[async_trait]
impl WorkspaceDirectory for RestBackend {
    async fn list_accounts(&self, _user_id: Uuid) -> DomainResult<Vec<Account>> {
        // The service scopes rows to the bearer token; the user id is
        // implicit in the session
        self.client
            .list_accounts()
            .await
            .map_err(|e| DomainError::service(e.to_string()))
    }

    async fn get_personal_workspace(&self, _user_id: Uuid) -> DomainResult<Account> {
        self.client
            .get_personal_workspace()
            .await
            .map_err(|e| DomainError::service(e.to_string()))?
            .ok_or_else(|| DomainError::not_found("no personal workspace for user"))
    }

    async fn get_team_workspace(&self, slug: &str) -> DomainResult<Account> {
        self.client
            .get_team_workspace(slug)
            .await
            .map_err(|e| DomainError::service(e.to_string()))?
            .ok_or_else(|| DomainError::not_found(format!("no team workspace '{}'", slug)))
    }

    async fn update_account(&self, account: &Account) -> DomainResult<Account> {
        self.client
            .update_account(account)
            .await
            .map_err(|e| DomainError::service(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_bad_scheme() {
        let result = RestClient::new("ftp://api.taskflow.app", "key");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("http"));
    }

    #[test]
    fn test_reject_empty_api_key() {
        let result = RestClient::new("https://api.taskflow.app", "  ");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RestClient::new("https://api.taskflow.app/", "key").unwrap();
        assert_eq!(client.auth_url("/token"), "https://api.taskflow.app/auth/v1/token");
        assert_eq!(client.rest_url("/accounts"), "https://api.taskflow.app/rest/v1/accounts");
    }

    #[test]
    fn test_decode_jwt_expiry() {
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(r#"{"sub":"abc","exp":1700000000}"#);
        let token = format!("header.{}.sig", payload);
        let expiry = decode_jwt_expiry(&token).unwrap();
        assert_eq!(expiry.timestamp(), 1700000000);

        assert!(decode_jwt_expiry("not-a-jwt").is_none());
    }

    #[test]
    fn test_account_dto_mapping() {
        let dto: AccountDto = serde_json::from_value(serde_json::json!({
            "id": "11111111-1111-1111-1111-111111111111",
            "slug": "acme",
            "name": "Acme Corp",
            "account_type": "team",
            "account_info": { "profile_completed_at": "2025-01-01T00:00:00Z" },
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-02T00:00:00Z"
        }))
        .unwrap();

        let account = map_account(dto);
        assert_eq!(account.slug, "acme");
        assert_eq!(account.account_type, AccountType::Team);
        assert!(account.profile_completed_at().is_some());
        assert!(account.account_settings.is_empty());
    }

    #[test]
    fn test_session_expiry_falls_back_to_jwt() {
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(r#"{"exp":1700000000}"#);
        let dto: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": format!("h.{}.s", payload),
            "user": {
                "id": "11111111-1111-1111-1111-111111111111",
                "email": "jane@example.com",
                "created_at": "2025-01-01T00:00:00Z"
            }
        }))
        .unwrap();

        let session = map_session(dto);
        assert_eq!(session.expires_at.unwrap().timestamp(), 1700000000);
    }
}
