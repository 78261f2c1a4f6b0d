//! Roster: the players currently present.
//!
//! This is a read-only view over the identity registry. Membership only
//! changes as a side effect of binding and unbinding identities.

use super::registry::{IdentityRegistry, PlayerIdentity, PlayerKey};
use crate::error::GameError;
use crate::types::{ConnectionId, DurableId, PlayerSummary};

/// Trim a requested display name, rejecting blank ones
pub fn normalize_name(raw: &str) -> Result<String, GameError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(GameError::BlankName);
    }
    Ok(name.to_string())
}

#[derive(Clone, Copy)]
pub struct Roster<'a> {
    registry: &'a IdentityRegistry,
}

impl<'a> Roster<'a> {
    pub fn new(registry: &'a IdentityRegistry) -> Self {
        Self { registry }
    }

    pub fn len(&self) -> usize {
        self.registry.bound_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn members(&self) -> impl Iterator<Item = (PlayerKey, &'a PlayerIdentity)> {
        self.registry.bound()
    }

    pub fn contains(&self, key: PlayerKey) -> bool {
        self.registry.get(key).is_some_and(PlayerIdentity::is_bound)
    }

    pub fn durable_ids(&self) -> Vec<DurableId> {
        self.members()
            .map(|(_, p)| p.durable_id().clone())
            .collect()
    }

    /// First present connection in roster order
    pub fn first_connection(&self) -> Option<&'a ConnectionId> {
        self.members().find_map(|(_, p)| p.connection())
    }

    /// Present player using `name`, compared case-insensitively
    pub fn name_owner(&self, name: &str) -> Option<PlayerKey> {
        let wanted = name.to_lowercase();
        self.members()
            .find(|(_, p)| p.display_name().to_lowercase() == wanted)
            .map(|(key, _)| key)
    }

    /// Check whether `joining` (None for a new identity) may be present
    /// under `name`
    pub fn admit(
        &self,
        name: &str,
        joining: Option<PlayerKey>,
        max_players: usize,
    ) -> Result<(), GameError> {
        if let Some(owner) = self.name_owner(name) {
            if Some(owner) != joining {
                return Err(GameError::NameTaken);
            }
        }

        let already_present = joining.is_some_and(|key| self.contains(key));
        if !already_present && self.len() >= max_players {
            return Err(GameError::LobbyFull(max_players));
        }

        Ok(())
    }

    pub fn summaries(&self) -> Vec<PlayerSummary> {
        self.members()
            .filter_map(|(_, p)| {
                p.connection().map(|connection| PlayerSummary {
                    connection_id: connection.clone(),
                    display_name: p.display_name().to_string(),
                })
            })
            .collect()
    }
}
