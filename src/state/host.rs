//! Host election
//!
//! The host is tracked by connection. It moves with its player on restore
//! and is re-elected from the roster when the host's connection goes away.

use super::roster::Roster;
use crate::types::ConnectionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostChange {
    Unchanged,
    Elected(ConnectionId),
    Cleared,
}

impl HostChange {
    pub fn changed(&self) -> bool {
        !matches!(self, HostChange::Unchanged)
    }
}

#[derive(Debug, Default)]
pub struct HostElection {
    host: Option<ConnectionId>,
}

impl HostElection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ConnectionId> {
        self.host.as_ref()
    }

    pub fn is_host(&self, connection: &str) -> bool {
        self.host.as_deref() == Some(connection)
    }

    /// Newly bound connections take the role only while it is vacant
    pub fn claim_if_vacant(&mut self, connection: &str) -> HostChange {
        if self.host.is_some() {
            return HostChange::Unchanged;
        }
        self.host = Some(connection.to_string());
        HostChange::Elected(connection.to_string())
    }

    /// Move the role from `from` to `to` if `from` holds it
    pub fn transfer(&mut self, from: &str, to: &str) -> HostChange {
        if !self.is_host(from) || from == to {
            return HostChange::Unchanged;
        }
        self.host = Some(to.to_string());
        HostChange::Elected(to.to_string())
    }

    /// Called after `departed` left the roster. Picks the first remaining
    /// roster entry if `departed` was host, or clears the role when nobody
    /// is left.
    pub fn reelect(&mut self, departed: &str, roster: &Roster<'_>) -> HostChange {
        if !self.is_host(departed) {
            return HostChange::Unchanged;
        }
        match roster.first_connection() {
            Some(next) => {
                self.host = Some(next.clone());
                HostChange::Elected(next.clone())
            }
            None => {
                self.host = None;
                HostChange::Cleared
            }
        }
    }

    pub fn clear(&mut self) -> HostChange {
        match self.host.take() {
            Some(_) => HostChange::Cleared,
            None => HostChange::Unchanged,
        }
    }
}
