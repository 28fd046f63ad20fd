//! Authentication gateway for marksync.
//!
//! Thin client over the identity provider's HTTP endpoints: building the
//! third-party sign-in URL, fetching the signed-in user's profile, refreshing
//! tokens, and revoking a session. Credential entry and token issuance stay
//! with the provider; this crate only ever sees issued tokens.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::backend::http::BackendClient;
use crate::types::errors::AuthError;
use crate::types::user::{AuthUser, Session};

/// Trait defining the auth gateway interface.
#[async_trait]
pub trait AuthGatewayTrait: Send + Sync {
    /// URL to open in the user's browser for a third-party sign-in. The
    /// provider sends the browser back to `redirect_to` carrying tokens.
    fn authorize_url(&self, provider: &str, redirect_to: &str) -> String;

    /// Profile of the user an access token belongs to.
    async fn fetch_user(&self, access_token: &str) -> Result<AuthUser, AuthError>;

    /// Trades a refresh token for a fresh session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError>;

    /// Revokes the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

pub struct AuthGateway {
    client: Arc<BackendClient>,
}

// Wire shapes of the provider's responses. Only the fields the app reads.

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: WireMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct WireMetadata {
    full_name: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireTokens {
    access_token: String,
    refresh_token: Option<String>,
    user: WireUser,
}

impl From<WireUser> for AuthUser {
    fn from(wire: WireUser) -> Self {
        AuthUser {
            id: wire.id,
            email: wire.email,
            display_name: wire.user_metadata.full_name,
            avatar_url: wire.user_metadata.avatar_url,
        }
    }
}

impl AuthGateway {
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthGatewayTrait for AuthGateway {
    fn authorize_url(&self, provider: &str, redirect_to: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to)
            .finish();
        format!("{}?{}", self.client.auth_url("authorize"), query)
    }

    async fn fetch_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .client
            .http()
            .get(self.client.auth_url("user"))
            .header("apikey", self.client.api_key())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AuthError::Rejected(format!(
                "user lookup failed: HTTP {}",
                response.status()
            )));
        }
        let wire: WireUser = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        Ok(wire.into())
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let url = format!("{}?grant_type=refresh_token", self.client.auth_url("token"));
        let response = self
            .client
            .http()
            .post(url)
            .header("apikey", self.client.api_key())
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AuthError::Rejected(format!(
                "token refresh failed: HTTP {}",
                response.status()
            )));
        }
        let wire: WireTokens = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;

        // Subsequent REST calls should speak as the refreshed user.
        self.client
            .set_access_token(&wire.access_token)
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        debug!("session refreshed for {}", wire.user.id);

        Ok(Session {
            access_token: wire.access_token,
            refresh_token: wire.refresh_token,
            user: wire.user.into(),
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .http()
            .post(self.client.auth_url("logout"))
            .header("apikey", self.client.api_key())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AuthError::Rejected(format!(
                "sign-out failed: HTTP {}",
                response.status()
            )));
        }
        debug!("signed out");
        Ok(())
    }
}
