//! Credential seam to the external authentication flow.
//!
//! The signup/login screens are external collaborators; on success they
//! cache a bearer token. The session reads that token exactly once at start
//! through [`CredentialProvider`]. There is no anonymous mode: an absent
//! token is terminal for session start.

use std::fmt;

/// An opaque bearer token for the location server.
///
/// Never mutated by the core; never logged in full.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential(String);

impl SessionCredential {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the one auth frame that needs it.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

// Keeps tokens out of logs and debug dumps.
impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionCredential(***)")
    }
}

/// Supplies the session credential at session start.
///
/// Implemented by the external auth/session-storage component; the core
/// calls `token()` once per session start and never again.
pub trait CredentialProvider: Send + Sync {
    /// The cached bearer token, or `None` if the user is not signed in.
    fn token(&self) -> Option<SessionCredential>;
}

/// A fixed credential, for the CLI harness and tests.
#[derive(Clone, Debug)]
pub struct StaticCredential(Option<SessionCredential>);

impl StaticCredential {
    /// A provider that always yields the given token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(SessionCredential::new(token)))
    }

    /// A provider that yields no token (signed-out state).
    #[must_use]
    pub fn absent() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticCredential {
    fn token(&self) -> Option<SessionCredential> {
        self.0.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_credential_yields_token() {
        let provider = StaticCredential::new("tok1");
        assert_eq!(provider.token().unwrap().expose(), "tok1");
    }

    #[test]
    fn absent_credential_yields_none() {
        let provider = StaticCredential::absent();
        assert!(provider.token().is_none());
    }

    #[test]
    fn debug_never_prints_token() {
        let cred = SessionCredential::new("super-secret");
        let debug = format!("{cred:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn read_is_repeatable_for_provider() {
        // The core reads once, but the provider itself is stateless.
        let provider = StaticCredential::new("tok");
        assert!(provider.token().is_some());
        assert!(provider.token().is_some());
    }
}
