//! Authoritative username → address directory.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use crate::error::JoinError;

/// Registry of connected clients.
///
/// Usernames are unique, and an address maps to at most one username.
/// Every mutation goes through [`ClientRegistry::join`] or
/// [`ClientRegistry::remove_by_addr`]; both are all-or-nothing.
#[derive(Debug, Clone)]
pub struct ClientRegistry {
    clients: BTreeMap<String, SocketAddr>,
    capacity: usize,
}

impl ClientRegistry {
    /// Creates an empty registry that holds at most `capacity` clients.
    pub fn new(capacity: usize) -> Self {
        Self {
            clients: BTreeMap::new(),
            capacity,
        }
    }

    /// Maximum number of clients.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if nobody is registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Registers `username` at `addr`.
    ///
    /// Checks run in order: capacity, username uniqueness, address uniqueness.
    pub fn join(&mut self, username: &str, addr: SocketAddr) -> Result<(), JoinError> {
        if self.clients.len() >= self.capacity {
            return Err(JoinError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        if self.clients.contains_key(username) {
            return Err(JoinError::UsernameTaken {
                username: username.to_string(),
            });
        }
        if let Some(existing) = self.username_for(addr) {
            return Err(JoinError::AddressInUse {
                addr,
                username: existing.to_string(),
            });
        }

        self.clients.insert(username.to_string(), addr);
        Ok(())
    }

    /// Removes the entry registered at `addr`, returning its username.
    pub fn remove_by_addr(&mut self, addr: SocketAddr) -> Option<String> {
        let username = self.username_for(addr)?.to_string();
        self.clients.remove(&username);
        Some(username)
    }

    /// Forward lookup.
    pub fn addr_of(&self, username: &str) -> Option<SocketAddr> {
        self.clients.get(username).copied()
    }

    /// Reverse lookup by linear scan.
    pub fn username_for(&self, addr: SocketAddr) -> Option<&str> {
        self.clients
            .iter()
            .find(|(_, registered)| **registered == addr)
            .map(|(name, _)| name.as_str())
    }

    /// Registered usernames in lexicographic order.
    pub fn usernames(&self) -> Vec<String> {
        self.clients.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn join_and_lookup() {
        let mut registry = ClientRegistry::new(10);
        registry.join("alice", addr(1000)).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.addr_of("alice"), Some(addr(1000)));
        assert_eq!(registry.username_for(addr(1000)), Some("alice"));
        assert_eq!(registry.username_for(addr(2000)), None);
    }

    #[test]
    fn duplicate_username_keeps_first_address() {
        let mut registry = ClientRegistry::new(10);
        registry.join("alice", addr(1000)).unwrap();

        let result = registry.join("alice", addr(2000));
        assert_eq!(
            result,
            Err(JoinError::UsernameTaken {
                username: "alice".into()
            })
        );
        assert_eq!(registry.addr_of("alice"), Some(addr(1000)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn capacity_checked_before_uniqueness() {
        let mut registry = ClientRegistry::new(2);
        registry.join("alice", addr(1000)).unwrap();
        registry.join("bob", addr(1001)).unwrap();

        assert_eq!(
            registry.join("alice", addr(1002)),
            Err(JoinError::CapacityExceeded { capacity: 2 })
        );
        assert_eq!(
            registry.join("carol", addr(1003)),
            Err(JoinError::CapacityExceeded { capacity: 2 })
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn address_maps_to_one_username() {
        let mut registry = ClientRegistry::new(10);
        registry.join("alice", addr(1000)).unwrap();

        assert!(matches!(
            registry.join("alicia", addr(1000)),
            Err(JoinError::AddressInUse { .. })
        ));
        assert_eq!(registry.usernames(), vec!["alice"]);
    }

    #[test]
    fn usernames_sorted() {
        let mut registry = ClientRegistry::new(10);
        registry.join("carol", addr(1000)).unwrap();
        registry.join("alice", addr(1001)).unwrap();
        registry.join("bob", addr(1002)).unwrap();

        assert_eq!(registry.usernames(), vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = ClientRegistry::new(10);
        registry.join("alice", addr(1000)).unwrap();
        registry.join("bob", addr(1001)).unwrap();

        assert_eq!(registry.remove_by_addr(addr(1000)), Some("alice".into()));
        assert_eq!(registry.remove_by_addr(addr(1000)), None);
        assert_eq!(registry.usernames(), vec!["bob"]);
    }

    #[test]
    fn username_reusable_after_removal() {
        let mut registry = ClientRegistry::new(1);
        registry.join("alice", addr(1000)).unwrap();
        registry.remove_by_addr(addr(1000));

        registry.join("alice", addr(2000)).unwrap();
        assert_eq!(registry.addr_of("alice"), Some(addr(2000)));
        assert!(!registry.is_empty());
    }
}
