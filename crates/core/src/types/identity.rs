//! External identity signal consumed by the store.
//!
//! Authentication itself happens elsewhere; the store only observes whether a
//! session is still resolving, signed in, or anonymous.

use secrecy::SecretString;

/// Opaque metadata about a signed-in shopper.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Stable subject identifier from the session service.
    pub subject: String,
    /// Bearer token for the remote cart service, if the session carries one.
    pub access_token: Option<SecretString>,
}

impl Identity {
    /// Create an identity without an access token.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            access_token: None,
        }
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.access_token = Some(token);
        self
    }
}

/// Three-valued session status.
#[derive(Debug, Clone, Default)]
pub enum IdentityStatus {
    /// The session service has not answered yet.
    #[default]
    Resolving,
    /// A shopper is signed in.
    Identified(Identity),
    /// No shopper is signed in.
    Anonymous,
}

impl IdentityStatus {
    /// The identity, when signed in.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Identified(identity) => Some(identity),
            Self::Resolving | Self::Anonymous => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_debug_redacts_token() {
        let identity =
            Identity::new("customer-1").with_token(SecretString::from("tok_live_abcdef"));
        let debug_output = format!("{identity:?}");
        assert!(debug_output.contains("customer-1"));
        assert!(!debug_output.contains("tok_live_abcdef"));
    }

    #[test]
    fn test_identity_accessor() {
        assert!(IdentityStatus::Resolving.identity().is_none());
        assert!(IdentityStatus::Anonymous.identity().is_none());
        let status = IdentityStatus::Identified(Identity::new("c"));
        assert_eq!(status.identity().map(|i| i.subject.as_str()), Some("c"));
    }
}
