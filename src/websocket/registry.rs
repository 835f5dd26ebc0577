//! Session Registry
//!
//! Concurrent map from connection id to [`Connection`] handle. Backed by a
//! sharded `DashMap`, so registration, removal and broadcast snapshots from
//! many tasks never need an outer lock.

use dashmap::DashMap;

use super::connection::{Connection, ConnectionId};

/// Live connections of one channel
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<ConnectionId, Connection>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `id`
    pub fn put(&self, id: impl Into<ConnectionId>, conn: Connection) {
        self.sessions.insert(id.into(), conn);
    }

    /// Remove the entry for `id`
    ///
    /// Returns the removed handle, `None` if nothing was registered.
    /// Removing an absent id is not an error.
    pub fn remove(&self, id: &str) -> Option<Connection> {
        self.sessions.remove(id).map(|(_, conn)| conn)
    }

    pub fn get(&self, id: &str) -> Option<Connection> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Point-in-time copy of every registered handle
    ///
    /// Shard locks are held only while cloning, never across a send.
    pub fn snapshot(&self) -> Vec<Connection> {
        self.sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_put_get_remove() {
        let registry = SessionRegistry::new();
        let (conn, _rx) = Connection::with_id("a", 1);

        registry.put("a", conn);
        assert!(registry.contains("a"));
        assert_eq!(registry.get("a").map(|c| c.id().to_string()), Some("a".to_string()));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove("a").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = SessionRegistry::new();
        let (a, _ra) = Connection::with_id("a", 1);
        let (b, _rb) = Connection::with_id("b", 1);
        registry.put("a", a);
        registry.put("b", b);

        assert!(registry.remove("a").is_some());
        assert_eq!(registry.len(), 1);
        assert!(registry.remove("a").is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.remove("never-registered").is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let registry = SessionRegistry::new();
        let (first, _r1) = Connection::with_id("a", 1);
        let (second, _r2) = Connection::with_id("a", 1);
        first.mark_closed();

        registry.put("a", first);
        registry.put("a", second);

        assert_eq!(registry.len(), 1);
        assert!(registry.get("a").unwrap().is_open());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = SessionRegistry::new();
        let (a, _ra) = Connection::with_id("a", 1);
        registry.put("a", a);

        let snapshot = registry.snapshot();
        registry.remove("a");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id(), "a");
        assert!(registry.snapshot().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_put_remove_snapshot() {
        let registry = Arc::new(SessionRegistry::new());
        let mut receivers = Vec::new();
        let mut writers = Vec::new();

        for worker in 0..8 {
            let mut handles = Vec::new();
            for n in 0..50 {
                let (conn, rx) = Connection::with_id(format!("w{}-{}", worker, n), 1);
                handles.push(conn);
                receivers.push(rx);
            }
            let registry = Arc::clone(&registry);
            writers.push(tokio::spawn(async move {
                for conn in handles {
                    let id = conn.id().to_string();
                    registry.put(id.clone(), conn);
                    tokio::task::yield_now().await;
                    registry.remove(&id);
                    registry.remove(&id);
                }
            }));
        }

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    for _ in 0..200 {
                        let snapshot = registry.snapshot();
                        let ids: HashSet<_> = snapshot.iter().map(|c| c.id().to_string()).collect();
                        assert_eq!(ids.len(), snapshot.len());
                        assert!(ids.iter().all(|id| id.starts_with('w')));
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        for task in writers.into_iter().chain(readers) {
            task.await.unwrap();
        }

        assert!(registry.is_empty());
        drop(receivers);
    }
}
