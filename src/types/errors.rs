use std::fmt;

// === StoreError ===

/// Errors from the record store collaborator.
#[derive(Debug)]
pub enum StoreError {
    /// The request never got an answer (connect, send, or body read failed).
    Network(String),
    /// The backend answered with a non-success status.
    Backend(String),
    /// The response body could not be decoded.
    Decode(String),
    /// An insert asked for the created record back and got nothing.
    EmptyInsert,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Network(msg) => write!(f, "Store network error: {}", msg),
            StoreError::Backend(msg) => write!(f, "Store backend error: {}", msg),
            StoreError::Decode(msg) => write!(f, "Store decode error: {}", msg),
            StoreError::EmptyInsert => write!(f, "Insert returned no record"),
        }
    }
}

impl std::error::Error for StoreError {}

// === AuthError ===

/// Errors from the authentication gateway.
#[derive(Debug)]
pub enum AuthError {
    /// The request never reached the identity provider.
    Network(String),
    /// The identity provider refused the request (expired token, bad grant).
    Rejected(String),
    /// The provider's response could not be decoded.
    Decode(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Network(msg) => write!(f, "Auth network error: {}", msg),
            AuthError::Rejected(msg) => write!(f, "Auth request rejected: {}", msg),
            AuthError::Decode(msg) => write!(f, "Auth decode error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

// === FeedError ===

/// Errors from the change feed collaborator.
#[derive(Debug)]
pub enum FeedError {
    /// Establishing the subscription failed.
    Subscribe(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Subscribe(msg) => write!(f, "Feed subscribe error: {}", msg),
        }
    }
}

impl std::error::Error for FeedError {}

// === ConfigError ===

/// Errors resolving or validating runtime configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Reading the configuration file failed.
    Io(String),
    /// The configuration file is not valid JSON.
    Parse(String),
    /// A required setting is absent.
    MissingKey(String),
    /// The configured backend URL does not parse.
    InvalidUrl(String),
    /// A key or token cannot be sent as an HTTP header.
    InvalidKey(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::MissingKey(key) => write!(f, "Missing config key: {}", key),
            ConfigError::InvalidUrl(msg) => write!(f, "Invalid backend URL: {}", msg),
            ConfigError::InvalidKey(msg) => write!(f, "Invalid API key: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
