use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::macros::str_opt_ref;

/// A bearer token issued by the client-credentials grant.
///
/// The access token itself is opaque; the remaining fields are the metadata the
/// authorization server sends alongside it.
#[derive(Clone, Serialize, Deserialize)]
pub struct Token {
    /// The opaque bearer string.
    access_token: String,

    /// Usually `Bearer`.
    #[serde(default = "default_token_type")]
    token_type: String,

    /// Lifetime of the token in seconds, counted from issue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_in: Option<i64>,

    /// Space separated list of granted scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<String>,

    /// When the token response was received.
    #[serde(skip, default = "Utc::now")]
    issued_at: DateTime<Utc>,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

fn default_token_type() -> String {
    String::from("Bearer")
}

impl Token {
    /// Returns the opaque access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the token type reported by the server.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Returns the lifetime of the token in seconds (if reported).
    pub fn expires_in(&self) -> Option<i64> {
        self.expires_in
    }

    /// Returns the raw, space separated scope string (if reported).
    pub fn scope(&self) -> Option<&str> {
        str_opt_ref!(self.scope)
    }

    /// Returns an iterator over the individual granted scopes.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
    }

    /// Returns the time at which the token was received.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns the time at which the token stops being valid.
    ///
    /// Tokens without an `expires_in` never expire.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_in
            .map(|secs| self.issued_at + Duration::seconds(secs))
    }

    /// Returns true once the token's lifetime has passed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| now >= at)
    }

    /// Returns the value of the `Authorization` header for this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}
