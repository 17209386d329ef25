//! Identity token lookup.
//!
//! The session asks its [`IdentityProvider`] for a token right before each
//! generation, so a login that happens between two runs is picked up.

/// Environment variable read by [`EnvIdentity::default`].
pub const IDENTITY_ENV_VAR: &str = "LUMEN_IDENTITY";

/// Source of the caller's identity token.
pub trait IdentityProvider: Send + Sync {
    /// Current token, or `None` when the user is not logged in.
    fn identity(&self) -> Option<String>;
}

/// Fixed identity, mostly for tests and one-shot tools.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity(Option<String>);

impl StaticIdentity {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// A provider that is never logged in.
    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn identity(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reads the token from an environment variable on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvIdentity {
    var: String,
}

impl EnvIdentity {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvIdentity {
    fn default() -> Self {
        Self::new(IDENTITY_ENV_VAR)
    }
}

impl IdentityProvider for EnvIdentity {
    fn identity(&self) -> Option<String> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => {
                tracing::debug!(var = %self.var, "Using identity from environment");
                Some(token)
            }
            _ => None,
        }
    }
}
