//! Lifecycle phases of the mode orchestrator.

use serde::{Deserialize, Serialize};

/// Where the store is in its identity lifecycle.
///
/// ```text
/// Init --(mount)--> Resolving
/// Resolving --(anonymous)--> GuestReady
/// Resolving --(identified)--> SyncingRemote
/// SyncingRemote --(fetch settles)--> IdentifiedReady
/// GuestReady --(identified)--> SyncingRemote
/// IdentifiedReady --(anonymous)--> GuestReady
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Init,
    Resolving,
    GuestReady,
    SyncingRemote,
    IdentifiedReady,
}

impl Phase {
    /// Whether mutations go to the remote service in this phase.
    #[must_use]
    pub const fn is_identified(self) -> bool {
        matches!(self, Self::SyncingRemote | Self::IdentifiedReady)
    }

    /// Whether mutations are accepted at all in this phase.
    #[must_use]
    pub const fn accepts_mutations(self) -> bool {
        !matches!(self, Self::Init | Self::Resolving)
    }
}
