//! Identity registry
//!
//! Players are stored in an arena of identity records. Two indexes map a
//! connection id and a durable id to the record's slot. A durable id is
//! minted once and never changes; `restore` is the only way to move an
//! identity whose connection is gone onto a new connection.

use crate::error::GameError;
use crate::types::{ConnectionId, DurableId};
use std::collections::HashMap;

/// Slot in the identity arena. Slots are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerKey(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    durable_id: DurableId,
    display_name: String,
    connection: Option<ConnectionId>,
}

impl PlayerIdentity {
    pub fn durable_id(&self) -> &DurableId {
        &self.durable_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The connection this identity is bound to, None while detached
    pub fn connection(&self) -> Option<&ConnectionId> {
        self.connection.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.connection.is_some()
    }
}

/// Result of attaching an identity to a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub key: PlayerKey,
    pub durable_id: DurableId,
    /// Connection the identity was bound to until now, if different
    pub replaced_connection: Option<ConnectionId>,
    /// Whether the identity was present in the roster before this call
    pub was_bound: bool,
    pub minted: bool,
}

#[derive(Debug, Default)]
pub struct IdentityRegistry {
    arena: Vec<Option<PlayerIdentity>>,
    by_connection: HashMap<ConnectionId, PlayerKey>,
    by_durable: HashMap<DurableId, PlayerKey>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: PlayerKey) -> Option<&PlayerIdentity> {
        self.arena.get(key.0).and_then(|slot| slot.as_ref())
    }

    pub fn key_for_connection(&self, connection: &str) -> Option<PlayerKey> {
        self.by_connection.get(connection).copied()
    }

    pub fn key_for_durable(&self, durable_id: &str) -> Option<PlayerKey> {
        self.by_durable.get(durable_id).copied()
    }

    /// Identity currently bound to `connection`
    pub fn resolve(&self, connection: &str) -> Option<&PlayerIdentity> {
        self.key_for_connection(connection)
            .and_then(|key| self.get(key))
    }

    /// Bind `connection` to the identity owning `durable_id`, or to a freshly
    /// minted identity when no id is given or the id is unknown.
    ///
    /// A known identity keeps its display name and `display_name` is ignored.
    /// Name validation is the caller's job.
    pub fn bind(
        &mut self,
        durable_id: Option<&str>,
        connection: ConnectionId,
        display_name: String,
    ) -> Binding {
        let existing = durable_id.and_then(|id| self.key_for_durable(id));
        if let Some(key) = existing {
            if let Some(identity) = self.arena.get_mut(key.0).and_then(|slot| slot.as_mut()) {
                let durable_id = identity.durable_id.clone();
                let was_bound = identity.is_bound();
                let replaced_connection = self.attach(key, connection);
                return Binding {
                    key,
                    durable_id,
                    replaced_connection,
                    was_bound,
                    minted: false,
                };
            }
        }

        let durable_id = ulid::Ulid::new().to_string();
        let key = PlayerKey(self.arena.len());
        self.arena.push(Some(PlayerIdentity {
            durable_id: durable_id.clone(),
            display_name,
            connection: None,
        }));
        self.by_durable.insert(durable_id.clone(), key);
        self.attach(key, connection);

        Binding {
            key,
            durable_id,
            replaced_connection: None,
            was_bound: false,
            minted: true,
        }
    }

    /// Re-bind a known identity to `connection`, dropping its stale mapping
    pub fn restore(
        &mut self,
        durable_id: &str,
        connection: ConnectionId,
    ) -> Result<Binding, GameError> {
        let key = self
            .key_for_durable(durable_id)
            .ok_or(GameError::NoSuchSession)?;
        let was_bound = self.get(key).is_some_and(PlayerIdentity::is_bound);
        let replaced_connection = self.attach(key, connection);

        Ok(Binding {
            key,
            durable_id: durable_id.to_string(),
            replaced_connection,
            was_bound,
            minted: false,
        })
    }

    /// Detach whatever identity is bound to `connection`. The identity is
    /// kept so it can be restored later.
    pub fn unbind(&mut self, connection: &str) -> Option<PlayerKey> {
        let key = self.by_connection.remove(connection)?;
        if let Some(identity) = self.arena.get_mut(key.0).and_then(|slot| slot.as_mut()) {
            identity.connection = None;
        }
        Some(key)
    }

    /// Destroy an identity; its durable id can no longer be restored
    pub fn purge(&mut self, key: PlayerKey) -> Option<PlayerIdentity> {
        let identity = self.arena.get_mut(key.0)?.take()?;
        self.by_durable.remove(&identity.durable_id);
        if let Some(connection) = &identity.connection {
            self.by_connection.remove(connection);
        }
        Some(identity)
    }

    /// Purge every identity that is currently detached
    pub fn sweep_detached(&mut self) -> usize {
        let detached: Vec<PlayerKey> = self
            .arena
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.as_ref().is_some_and(|p| !p.is_bound()))
            .map(|(idx, _)| PlayerKey(idx))
            .collect();

        for key in &detached {
            self.purge(*key);
        }
        detached.len()
    }

    /// Bound identities in arena order
    pub fn bound(&self) -> impl Iterator<Item = (PlayerKey, &PlayerIdentity)> {
        self.arena
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|p| (PlayerKey(idx), p)))
            .filter(|(_, p)| p.is_bound())
    }

    pub fn bound_count(&self) -> usize {
        self.by_connection.len()
    }

    /// Point `key` at `connection`, keeping both indexes consistent.
    /// Returns the identity's previous connection if it was a different one.
    fn attach(&mut self, key: PlayerKey, connection: ConnectionId) -> Option<ConnectionId> {
        // A connection carries at most one identity
        if let Some(other) = self.by_connection.insert(connection.clone(), key) {
            if other != key {
                if let Some(p) = self.arena.get_mut(other.0).and_then(|slot| slot.as_mut()) {
                    p.connection = None;
                }
            }
        }

        let identity = self.arena.get_mut(key.0).and_then(|slot| slot.as_mut())?;
        let previous = identity.connection.replace(connection.clone());
        match previous {
            Some(prev) if prev != connection => {
                self.by_connection.remove(&prev);
                Some(prev)
            }
            _ => None,
        }
    }
}
