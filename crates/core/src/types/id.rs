//! Origin-tagged IDs for cart lines and wishlist entries.
//!
//! Every line or entry ID records where it came from: minted on this device
//! ([`Origin::Local`]) or issued by the remote cart service
//! ([`Origin::Remote`]). The tag decides whether a mutation on that line needs
//! a network call, independently of whether the shopper is signed in.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Prefix marking a locally minted ID in its string form.
pub const LOCAL_PREFIX: &str = "local:";

/// Escape prefix for remote IDs whose value would otherwise read as tagged.
pub const REMOTE_PREFIX: &str = "remote:";

/// Whether a remote value must be escaped to keep its origin when printed.
#[must_use]
pub fn needs_remote_escape(value: &str) -> bool {
    value.starts_with(LOCAL_PREFIX) || value.starts_with(REMOTE_PREFIX)
}

/// Where an ID was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Minted on this device; no remote counterpart exists yet.
    Local,
    /// Issued by the remote cart/wishlist service.
    Remote,
}

/// Generate the value part of a fresh local ID.
#[must_use]
pub fn mint_local_value() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Macro to define an origin-tagged ID wrapper.
///
/// Creates a string-backed newtype with:
/// - `Serialize`/`Deserialize` through its string form (`local:<uuid>` for
///   local IDs, the raw value for remote IDs; a remote value that itself starts
///   with `local:` or `remote:` is written as `remote:<value>`)
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Constructors: `mint()` (local), `remote()`
/// - Accessors: `origin()`, `is_local()`, `value()`
///
/// # Example
///
/// ```rust
/// # use basket_core::{define_id, Origin};
/// define_id!(LineId);
///
/// let local = LineId::mint();
/// let remote = LineId::remote("gid://cart/Line/42");
///
/// assert_eq!(local.origin(), Origin::Local);
/// assert_eq!(remote.value(), "gid://cart/Line/42");
/// assert_eq!(LineId::from(local.to_string()), local);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(into = "String", from = "String")]
        pub struct $name {
            origin: $crate::Origin,
            value: String,
        }

        impl $name {
            /// Mint a new local ID.
            #[must_use]
            pub fn mint() -> Self {
                Self {
                    origin: $crate::Origin::Local,
                    value: $crate::mint_local_value(),
                }
            }

            /// Wrap an ID issued by the remote service.
            #[must_use]
            pub fn remote(value: impl Into<String>) -> Self {
                Self {
                    origin: $crate::Origin::Remote,
                    value: value.into(),
                }
            }

            /// Where this ID was issued.
            #[must_use]
            pub const fn origin(&self) -> $crate::Origin {
                self.origin
            }

            /// Whether this ID was minted locally.
            #[must_use]
            pub const fn is_local(&self) -> bool {
                matches!(self.origin, $crate::Origin::Local)
            }

            /// The ID value without its origin prefix.
            ///
            /// For remote IDs this is exactly what the remote service issued.
            #[must_use]
            pub fn value(&self) -> &str {
                &self.value
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                match self.origin {
                    $crate::Origin::Local => write!(f, "{}{}", $crate::LOCAL_PREFIX, self.value),
                    $crate::Origin::Remote if $crate::needs_remote_escape(&self.value) => {
                        write!(f, "{}{}", $crate::REMOTE_PREFIX, self.value)
                    }
                    $crate::Origin::Remote => f.write_str(&self.value),
                }
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                if let Some(value) = raw.strip_prefix($crate::REMOTE_PREFIX) {
                    return Self::remote(value);
                }
                match raw.strip_prefix($crate::LOCAL_PREFIX) {
                    Some(value) => Self {
                        origin: $crate::Origin::Local,
                        value: value.to_string(),
                    },
                    None => Self {
                        origin: $crate::Origin::Remote,
                        value: raw,
                    },
                }
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::from(raw.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }
    };
}

define_id!(CartLineId);
define_id!(WishlistEntryId);

/// Catalog product reference.
///
/// Product IDs come from the catalog and carry no origin tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
