use serde::{Deserialize, Serialize};

/// Profile of an authenticated user, as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl AuthUser {
    /// First name for greetings, with a generic fallback.
    pub fn first_name(&self) -> &str {
        self.display_name
            .as_deref()
            .and_then(|name| name.split_whitespace().next())
            .unwrap_or("there")
    }
}

/// A signed-in session: provider tokens plus the user they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}
