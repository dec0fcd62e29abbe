use std::sync::Arc;

use tokio::sync::{RwLock, oneshot};

use crate::limits::*;
use crate::model::*;

use super::policy::validate_span;
use super::{Engine, EngineError, JournalCommand};

impl Engine {
    pub async fn create_user(&self, name: &str, email: &str) -> Result<User, EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::InvalidInput("name is required"));
        }
        if email.trim().is_empty() {
            return Err(EngineError::InvalidInput("email is required"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(EngineError::InvalidInput("name too long"));
        }
        if email.len() > MAX_EMAIL_LEN {
            return Err(EngineError::InvalidInput("email too long"));
        }
        if self.users.len() >= MAX_USERS {
            return Err(EngineError::InvalidInput("too many users"));
        }

        let id = self.alloc_user_id();
        let event = Event::UserCreated {
            id,
            name: name.to_string(),
            email: email.to_string(),
        };
        self.journal_append(&event).await?;
        let user = User {
            id,
            name: name.to_string(),
            email: email.to_string(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    /// Returns whether a user was removed. An unknown id is reported, not fatal.
    /// Bookings made by the user are left in place; they still match
    /// `bookings_by_user` on the stale id.
    pub async fn delete_user(&self, id: UserId) -> Result<bool, EngineError> {
        if !self.users.contains_key(&id) {
            return Ok(false);
        }
        self.journal_append(&Event::UserDeleted { id }).await?;
        self.users.remove(&id);
        Ok(true)
    }

    pub async fn create_room(
        &self,
        name: &str,
        capacity: u32,
        location: Option<String>,
    ) -> Result<Room, EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::InvalidInput("name is required"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(EngineError::InvalidInput("name too long"));
        }
        if capacity == 0 {
            return Err(EngineError::InvalidInput("capacity must be positive"));
        }
        if let Some(ref loc) = location
            && loc.len() > MAX_LOCATION_LEN
        {
            return Err(EngineError::InvalidInput("location too long"));
        }
        if self.rooms.len() >= MAX_ROOMS {
            return Err(EngineError::InvalidInput("too many rooms"));
        }

        let id = self.alloc_room_id();
        let event = Event::RoomCreated {
            id,
            name: name.to_string(),
            capacity,
            location: location.clone(),
        };
        self.journal_append(&event).await?;
        let rs = RoomState::new(id, name.to_string(), capacity, location.clone());
        let info = rs.info();
        self.rooms.insert(id, Arc::new(RwLock::new(rs)));
        Ok(info)
    }

    /// Returns whether a room was removed. The room's bookings go with it.
    pub async fn delete_room(&self, id: RoomId) -> Result<bool, EngineError> {
        let Some(rs) = self.get_room(&id) else {
            return Ok(false);
        };
        let guard = rs.read().await;
        self.journal_append(&Event::RoomDeleted { id }).await?;
        for booking in &guard.bookings {
            self.booking_to_room.remove(&booking.id);
        }
        // Unregister while still holding the lock: a creator that already
        // cloned this room's Arc re-checks the registry under the write lock
        // and must see the removal.
        self.rooms.remove(&id);
        drop(guard);
        Ok(true)
    }

    /// Create a booking. The room's write lock is held across the whole
    /// fetch-existing / validate / insert sequence, so two overlapping
    /// requests for the same room cannot both pass validation.
    ///
    /// Validation runs BEFORE insertion — no transient invalid state is ever
    /// visible to readers, and a rejected candidate leaves no trace.
    pub async fn create_booking(
        &self,
        room_id: RoomId,
        user_id: UserId,
        span: Span,
    ) -> Result<Booking, EngineError> {
        validate_span(&span)?;
        if !self.users.contains_key(&user_id) {
            return Err(EngineError::UserNotFound(user_id));
        }
        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::RoomNotFound(room_id))?;
        let mut guard = rs.write().await;
        // The room may have been deleted between fetching its Arc and winning
        // the write lock. Without this re-check the booking would land in an
        // orphaned RoomState, invisible to every query.
        if !self.rooms.contains_key(&room_id) {
            return Err(EngineError::RoomNotFound(room_id));
        }
        if guard.bookings.len() >= MAX_BOOKINGS_PER_ROOM {
            return Err(EngineError::InvalidInput("too many bookings on room"));
        }

        // Candidate id 0 is a placeholder — the real id is assigned only
        // after the policy admits the booking.
        let candidate = Booking {
            id: 0,
            room_id,
            user_id,
            span,
        };
        if !self.policy.is_valid(&candidate, &guard.bookings) {
            metrics::counter!(crate::observability::BOOKING_CONFLICTS_TOTAL).increment(1);
            return Err(EngineError::Overlap { room_id, span });
        }

        let id = self.alloc_booking_id();
        let event = Event::BookingCreated {
            id,
            room_id,
            user_id,
            span,
        };
        self.journal_append(&event).await?;

        let booking = Booking {
            id,
            room_id,
            user_id,
            span,
        };
        guard.insert_booking(booking);
        self.booking_to_room.insert(id, room_id);
        metrics::counter!(crate::observability::BOOKINGS_CREATED_TOTAL).increment(1);
        Ok(booking)
    }

    /// Returns whether a booking was removed. An unknown id is reported, not
    /// fatal.
    pub async fn cancel_booking(&self, id: BookingId) -> Result<bool, EngineError> {
        let Some(room_id) = self.room_for_booking(&id) else {
            return Ok(false);
        };
        let Some(rs) = self.get_room(&room_id) else {
            // Room vanished under us — clear the stale index entry.
            self.booking_to_room.remove(&id);
            return Ok(false);
        };
        let mut guard = rs.write().await;
        self.journal_append(&Event::BookingCancelled { id, room_id })
            .await?;
        guard.remove_booking(id);
        self.booking_to_room.remove(&id);
        Ok(true)
    }

    /// Rewrite the journal with only the events needed to recreate the
    /// current state. Cancelled bookings and deleted entities drop out.
    pub async fn compact_journal(&self) -> Result<(), EngineError> {
        let mut events = Vec::new();

        for entry in self.users.iter() {
            let user = entry.value();
            events.push(Event::UserCreated {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
            });
        }

        let room_states: Vec<_> = self.rooms.iter().map(|e| e.value().clone()).collect();
        for rs in room_states {
            let guard = rs.read().await;
            events.push(Event::RoomCreated {
                id: guard.id,
                name: guard.name.clone(),
                capacity: guard.capacity,
                location: guard.location.clone(),
            });
            for booking in &guard.bookings {
                events.push(Event::BookingCreated {
                    id: booking.id,
                    room_id: booking.room_id,
                    user_id: booking.user_id,
                    span: booking.span,
                });
            }
        }

        let (tx, rx) = oneshot::channel();
        self.journal_tx
            .send(JournalCommand::Compact {
                events,
                response: tx,
            })
            .await
            .map_err(|_| EngineError::Journal("journal writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::Journal("journal writer dropped response".into()))?
            .map_err(|e| EngineError::Journal(e.to_string()))
    }

    pub async fn journal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .journal_tx
            .send(JournalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
