//! Room registry: owns every live room, keyed by its code.

use std::collections::HashMap;

use noughts_protocol::{RoomId, RoomSummary};
use noughts_transport::ConnectionId;

use crate::{Room, RoomConfig, RoomError};

/// All active rooms.
///
/// The registry is not synchronized; one task owns it and applies every
/// operation in arrival order.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    config: RoomConfig,
}

impl RoomRegistry {
    /// Creates an empty registry whose rooms use `config`.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
        }
    }

    /// Creates an empty room under a fresh random code and returns the code.
    pub fn create_room(&mut self) -> RoomId {
        let mut rng = rand::rng();
        let id = self.unique_id(|| RoomId::random(&mut rng));
        self.rooms
            .insert(id.clone(), Room::new(id.clone(), self.config.clone()));
        tracing::info!(room_id = %id, rooms = self.rooms.len(), "room created");
        id
    }

    /// Draws codes from `generate` until one is not in use.
    pub fn unique_id(&self, mut generate: impl FnMut() -> RoomId) -> RoomId {
        loop {
            let id = generate();
            if !self.rooms.contains_key(&id) {
                return id;
            }
            tracing::debug!(room_id = %id, "room code collision, retrying");
        }
    }

    /// Registers an already-built room. Existing rooms are never replaced.
    pub fn insert(&mut self, room: Room) -> Result<(), RoomError> {
        let id = room.id().clone();
        if self.rooms.contains_key(&id) {
            return Err(RoomError::DuplicateRoom(id));
        }
        self.rooms.insert(id, room);
        Ok(())
    }

    pub fn get(&self, id: &RoomId) -> Result<&Room, RoomError> {
        self.rooms
            .get(id)
            .ok_or_else(|| RoomError::NotFound(id.clone()))
    }

    pub fn get_mut(&mut self, id: &RoomId) -> Result<&mut Room, RoomError> {
        self.rooms
            .get_mut(id)
            .ok_or_else(|| RoomError::NotFound(id.clone()))
    }

    /// Drops a room outright, returning it if it existed.
    pub fn remove(&mut self, id: &RoomId) -> Option<Room> {
        let room = self.rooms.remove(id)?;
        tracing::info!(room_id = %id, rooms = self.rooms.len(), "room destroyed");
        Some(room)
    }

    /// Removes `conn` from every room it is in.
    ///
    /// Departure events are delivered to whoever remains; rooms left with
    /// nobody in them are destroyed. Returns the codes of the rooms `conn`
    /// was removed from.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Vec<RoomId> {
        let mut left = Vec::new();
        let mut emptied = Vec::new();

        for (id, room) in self.rooms.iter_mut() {
            let Some(events) = room.remove_participant(conn) else {
                continue;
            };
            room.dispatch(events);
            left.push(id.clone());
            if room.is_empty() {
                emptied.push(id.clone());
            }
        }

        for id in &emptied {
            self.remove(id);
        }
        left.sort();
        left
    }

    /// One summary per room, ordered by code.
    pub fn summaries(&self) -> Vec<RoomSummary> {
        let mut summaries: Vec<_> = self.rooms.values().map(Room::summary).collect();
        summaries.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        summaries
    }

    pub fn contains(&self, id: &RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[test]
    fn test_create_room_registers_well_formed_code() {
        let mut registry = RoomRegistry::default();
        let id = registry.create_room();
        assert!(id.is_well_formed());
        assert!(registry.contains(&id));
        assert!(registry.get(&id).unwrap().is_empty());
    }

    #[test]
    fn test_unique_id_retries_on_collision() {
        let mut registry = RoomRegistry::default();
        registry
            .insert(Room::new(RoomId::new("AAAAAA"), RoomConfig::default()))
            .unwrap();

        let mut script = vec![RoomId::new("BBBBBB"), RoomId::new("AAAAAA")];
        let id = registry.unique_id(|| script.pop().unwrap());
        assert_eq!(id, RoomId::new("BBBBBB"));
        assert!(script.is_empty());
    }

    #[test]
    fn test_insert_refuses_duplicates() {
        let mut registry = RoomRegistry::default();
        let id = RoomId::new("DUPE01");
        registry
            .insert(Room::new(id.clone(), RoomConfig::default()))
            .unwrap();
        let err = registry
            .insert(Room::new(id.clone(), RoomConfig::default()))
            .unwrap_err();
        assert_eq!(err, RoomError::DuplicateRoom(id));
        assert_eq!(err.to_string(), "Room DUPE01 already exists");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_room_is_not_found() {
        let mut registry = RoomRegistry::default();
        let id = RoomId::new("NOPE00");
        assert_eq!(
            registry.get_mut(&id).unwrap_err().to_string(),
            "Room NOPE00 not found"
        );
    }

    #[test]
    fn test_disconnect_destroys_empty_rooms_only() {
        let mut registry = RoomRegistry::default();
        let solo = registry.create_room();
        let shared = registry.create_room();
        let (tx, _rx) = mpsc::unbounded_channel();

        registry.get_mut(&solo).unwrap().add_player(conn(1), tx.clone(), "a").unwrap();
        registry.get_mut(&shared).unwrap().add_player(conn(1), tx.clone(), "a").unwrap();
        registry.get_mut(&shared).unwrap().add_spectator(conn(2), tx, "b").unwrap();

        let mut expected = vec![solo.clone(), shared.clone()];
        expected.sort();
        assert_eq!(registry.disconnect(conn(1)), expected);

        assert!(!registry.contains(&solo));
        assert!(registry.contains(&shared));
        assert_eq!(registry.get(&shared).unwrap().spectator_count(), 1);
    }

    #[test]
    fn test_disconnect_unknown_connection_is_noop() {
        let mut registry = RoomRegistry::default();
        registry.create_room();
        assert!(registry.disconnect(conn(99)).is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_summaries_are_sorted() {
        let mut registry = RoomRegistry::default();
        for code in ["ZZZZZZ", "AAAAAA", "MMMMMM"] {
            registry
                .insert(Room::new(RoomId::new(code), RoomConfig::default()))
                .unwrap();
        }
        let codes: Vec<_> = registry
            .summaries()
            .into_iter()
            .map(|s| s.room_id.as_str().to_string())
            .collect();
        assert_eq!(codes, ["AAAAAA", "MMMMMM", "ZZZZZZ"]);
    }
}
