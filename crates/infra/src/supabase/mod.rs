//! Supabase identity gateway
//!
//! Implements [`IdentityGateway`] against a Supabase-compatible backend:
//! GoTrue (`/auth/v1/*`) for identity and sessions, PostgREST
//! (`/rest/v1/profiles`) for the application profile table.
//!
//! The adapter owns two responsibilities the manager must never see:
//! - **Error classification.** Backend error bodies are mapped to tagged
//!   [`IdentityError`] kinds here (including the duplicate-registration
//!   forms), so the lifecycle manager never inspects message text.
//! - **Session persistence.** The session JSON lands in the credential
//!   store after sign-in/sign-up, is restored by `get_session`, and is
//!   purged on sign-out even when the remote call fails.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hikayat_core::{CredentialStore, IdentityError, IdentityGateway};
use hikayat_domain::constants::{PROFILES_TABLE, SESSION_STORAGE_KEY};
use hikayat_domain::{
    AuthGrant, AuthSession, AuthUser, BackendConfig, HikayatError, NewProfile, Result,
    SignUpRequest, UserProfile,
};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

/// HTTP adapter for the identity/profile backend.
pub struct SupabaseGateway {
    http: reqwest::Client,
    auth_url: String,
    rest_url: String,
    anon_key: String,
    credentials: Arc<dyn CredentialStore>,
}

/// The blob persisted in the credential store: the session plus the user
/// the backend returned alongside it, so restores avoid a network round
/// trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    session: AuthSession,
    #[serde(default)]
    user: Option<AuthUser>,
}

/// GoTrue session document, returned by the token and signup endpoints.
#[derive(Debug, Deserialize)]
struct SessionDocument {
    access_token: String,
    token_type: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    user: Option<AuthUser>,
}

impl SessionDocument {
    fn into_grant(self) -> AuthGrant {
        AuthGrant {
            user: self.user,
            session: Some(AuthSession {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
                token_type: self.token_type,
                expires_at: self.expires_at,
            }),
        }
    }
}

/// Sign-up responses come in two shapes: a full session document, or a
/// bare user when email confirmation is pending.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(SessionDocument),
    User(AuthUser),
}

/// GoTrue/PostgREST error body; every field is optional across versions.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorBody {
    fn display_message(&self, status: StatusCode) -> String {
        self.msg
            .clone()
            .or_else(|| self.message.clone())
            .or_else(|| self.error_description.clone())
            .unwrap_or_else(|| format!("Request failed with status {status}"))
    }
}

impl SupabaseGateway {
    /// Create a gateway for the configured backend.
    ///
    /// # Errors
    /// Returns `HikayatError::Config` when the base URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: &BackendConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let base = Url::parse(&config.url)
            .map_err(|e| HikayatError::Config(format!("Invalid backend URL: {e}")))?;
        let base = base.as_str().trim_end_matches('/').to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| HikayatError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            auth_url: format!("{base}/auth/v1"),
            rest_url: format!("{base}/rest/v1"),
            anon_key: config.anon_key.clone(),
            credentials: Arc::clone(&credentials),
        })
    }

    fn auth_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.auth_url))
            .header("apikey", &self.anon_key)
    }

    fn rest_request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{table}", self.rest_url))
            .header("apikey", &self.anon_key)
    }

    /// Bearer token for authenticated requests: the stored access token
    /// when a session is held, otherwise the anon key.
    async fn bearer_token(&self) -> String {
        match self.load_stored().await {
            Some(stored) => stored.session.access_token,
            None => self.anon_key.clone(),
        }
    }

    async fn load_stored(&self) -> Option<StoredSession> {
        let blob = self.credentials.get_item(SESSION_STORAGE_KEY).await?;
        match serde_json::from_str(&blob) {
            Ok(stored) => Some(stored),
            Err(err) => {
                warn!(error = %err, "stored session blob is corrupt, discarding");
                self.credentials.remove_item(SESSION_STORAGE_KEY).await;
                None
            }
        }
    }

    async fn persist_grant(&self, grant: &AuthGrant) {
        let Some(session) = &grant.session else { return };
        let stored = StoredSession { session: session.clone(), user: grant.user.clone() };
        match serde_json::to_string(&stored) {
            Ok(blob) => self.credentials.set_item(SESSION_STORAGE_KEY, &blob).await,
            Err(err) => warn!(error = %err, "failed to serialize session for persistence"),
        }
    }

    async fn error_from_response(response: reqwest::Response) -> IdentityError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        classify_error(status, &body)
    }
}

/// Map a backend error response to a tagged kind.
///
/// Duplicate registration is decided here, from the structured
/// `user_already_exists` code or the legacy "already registered" /
/// "already exists" message forms older GoTrue versions return.
fn classify_error(status: StatusCode, body: &str) -> IdentityError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed.display_message(status);

    let lowered = message.to_ascii_lowercase();
    if parsed.error_code.as_deref() == Some("user_already_exists")
        || lowered.contains("already registered")
        || lowered.contains("already exists")
    {
        return IdentityError::AlreadyRegistered(message);
    }

    if status.is_server_error() {
        IdentityError::Unexpected(message)
    } else {
        IdentityError::Rejected(message)
    }
}

fn network_error(err: reqwest::Error) -> IdentityError {
    IdentityError::Network(err.to_string())
}

#[async_trait]
impl IdentityGateway for SupabaseGateway {
    async fn sign_up(
        &self,
        request: &SignUpRequest,
    ) -> std::result::Result<AuthGrant, IdentityError> {
        let payload = json!({
            "email": request.email,
            "password": request.password,
            "data": {
                "profile_name": request.profile_name,
                "date_of_birth": request.date_of_birth,
            },
        });

        let response = self
            .auth_request(Method::POST, "/signup")
            .json(&payload)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let document: SignUpResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Unexpected(format!("Malformed sign-up response: {e}")))?;

        let grant = match document {
            SignUpResponse::Session(doc) => doc.into_grant(),
            SignUpResponse::User(user) => AuthGrant { user: Some(user), session: None },
        };

        self.persist_grant(&grant).await;
        debug!(session_issued = grant.session.is_some(), "sign-up accepted");
        Ok(grant)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<AuthGrant, IdentityError> {
        let response = self
            .auth_request(Method::POST, "/token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let document: SessionDocument = response
            .json()
            .await
            .map_err(|e| IdentityError::Unexpected(format!("Malformed session document: {e}")))?;

        let grant = document.into_grant();
        self.persist_grant(&grant).await;
        Ok(grant)
    }

    async fn sign_out(&self) -> std::result::Result<(), IdentityError> {
        let stored = self.load_stored().await;

        let remote = match stored {
            Some(stored) => {
                let response = self
                    .auth_request(Method::POST, "/logout")
                    .bearer_auth(&stored.session.access_token)
                    .send()
                    .await;

                match response {
                    Ok(resp) if resp.status().is_success() => Ok(()),
                    Ok(resp) => Err(Self::error_from_response(resp).await),
                    Err(err) => Err(network_error(err)),
                }
            }
            None => Ok(()),
        };

        // The purge happens on every path, remote failure included.
        self.credentials.remove_item(SESSION_STORAGE_KEY).await;
        remote
    }

    async fn get_session(&self) -> std::result::Result<Option<AuthSession>, IdentityError> {
        Ok(self.load_stored().await.map(|stored| stored.session))
    }

    async fn get_user(&self) -> std::result::Result<Option<AuthUser>, IdentityError> {
        let Some(stored) = self.load_stored().await else {
            return Ok(None);
        };

        if let Some(user) = stored.user {
            return Ok(Some(user));
        }

        let response = self
            .auth_request(Method::GET, "/user")
            .bearer_auth(&stored.session.access_token)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let user: AuthUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Unexpected(format!("Malformed user document: {e}")))?;
        Ok(Some(user))
    }

    async fn fetch_profile(
        &self,
        user_id: &str,
    ) -> std::result::Result<Option<UserProfile>, IdentityError> {
        let token = self.bearer_token().await;
        let response = self
            .rest_request(Method::GET, PROFILES_TABLE)
            .bearer_auth(token)
            .query(&[("id", format!("eq.{user_id}")), ("select", "*".to_string())])
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let rows: Vec<UserProfile> = response
            .json()
            .await
            .map_err(|e| IdentityError::Unexpected(format!("Malformed profile rows: {e}")))?;
        Ok(rows.into_iter().next())
    }

    async fn insert_profile(
        &self,
        profile: &NewProfile,
    ) -> std::result::Result<UserProfile, IdentityError> {
        let token = self.bearer_token().await;
        let response = self
            .rest_request(Method::POST, PROFILES_TABLE)
            .bearer_auth(token)
            .header("Prefer", "return=representation")
            .json(profile)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let mut rows: Vec<UserProfile> = response
            .json()
            .await
            .map_err(|e| IdentityError::Unexpected(format!("Malformed insert response: {e}")))?;

        rows.pop()
            .ok_or_else(|| IdentityError::Unexpected("Insert returned no representation".into()))
    }
}

impl std::fmt::Debug for SupabaseGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseGateway")
            .field("auth_url", &self.auth_url)
            .field("rest_url", &self.rest_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for error classification and wire parsing. End-to-end
    //! adapter flows live in `tests/gateway_flows.rs`.
    use super::*;

    /// Validates classification of the structured duplicate code.
    #[test]
    fn duplicate_code_classifies_as_already_registered() {
        let body = r#"{"code":422,"error_code":"user_already_exists","msg":"User already exists"}"#;
        let err = classify_error(StatusCode::UNPROCESSABLE_ENTITY, body);

        assert!(matches!(err, IdentityError::AlreadyRegistered(_)));
    }

    /// Validates classification of the legacy message form.
    #[test]
    fn legacy_duplicate_message_classifies_as_already_registered() {
        let body = r#"{"msg":"User already registered"}"#;
        let err = classify_error(StatusCode::BAD_REQUEST, body);

        assert!(matches!(err, IdentityError::AlreadyRegistered(_)));
    }

    /// Validates classification of a code-less "already exists" body.
    #[test]
    fn code_less_exists_message_classifies_as_already_registered() {
        let body = r#"{"msg":"User already exists"}"#;
        let err = classify_error(StatusCode::BAD_REQUEST, body);

        assert!(matches!(err, IdentityError::AlreadyRegistered(_)));
    }

    /// Validates ordinary rejections and server failures.
    #[test]
    fn status_splits_rejection_from_unexpected() {
        let body = r#"{"error_description":"Invalid login credentials"}"#;
        let err = classify_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(err, IdentityError::Rejected("Invalid login credentials".to_string()));

        let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert!(matches!(err, IdentityError::Unexpected(_)));
    }

    /// Validates both sign-up response shapes.
    #[test]
    fn sign_up_response_parses_both_shapes() {
        let with_session = r#"{
            "access_token": "at", "token_type": "bearer", "expires_at": 1760000000,
            "user": { "id": "u-1", "email": "nora@example.com" }
        }"#;
        let parsed: SignUpResponse = serde_json::from_str(with_session).unwrap();
        assert!(matches!(parsed, SignUpResponse::Session(_)));

        let confirmation_pending = r#"{ "id": "u-1", "email": "nora@example.com" }"#;
        let parsed: SignUpResponse = serde_json::from_str(confirmation_pending).unwrap();
        assert!(matches!(parsed, SignUpResponse::User(_)));
    }

    /// Validates the fallback display message when the body is opaque.
    #[test]
    fn opaque_body_falls_back_to_status_message() {
        let err = classify_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(err, IdentityError::Unexpected(msg) if msg.contains("502")));
    }
}
