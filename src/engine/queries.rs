use chrono::NaiveDate;

use crate::model::*;
use crate::timeutil::date_of;

use super::{Engine, EngineError};

impl Engine {
    pub fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        users
    }

    pub fn find_user_by_name(&self, name: &str) -> Option<User> {
        self.users
            .iter()
            .find(|e| e.value().name == name)
            .map(|e| e.value().clone())
    }

    pub async fn list_rooms(&self) -> Vec<Room> {
        let states: Vec<_> = self.rooms.iter().map(|e| e.value().clone()).collect();
        let mut rooms = Vec::with_capacity(states.len());
        for rs in states {
            rooms.push(rs.read().await.info());
        }
        rooms.sort_by_key(|r| r.id);
        rooms
    }

    pub async fn get_room_info(&self, id: RoomId) -> Option<Room> {
        let rs = self.get_room(&id)?;
        let guard = rs.read().await;
        Some(guard.info())
    }

    /// All bookings across all rooms, ordered by id. Ids are monotonic, so
    /// id order equals insertion order.
    pub async fn all_bookings(&self) -> Vec<Booking> {
        self.collect_bookings(|_| true).await
    }

    pub async fn bookings_by_user(&self, user_id: UserId) -> Vec<Booking> {
        self.collect_bookings(|b| b.user_id == user_id).await
    }

    pub async fn bookings_by_room(&self, room_id: RoomId) -> Vec<Booking> {
        match self.get_room(&room_id) {
            Some(rs) => {
                let guard = rs.read().await;
                let mut bookings = guard.bookings.clone();
                bookings.sort_by_key(|b| b.id);
                bookings
            }
            None => Vec::new(),
        }
    }

    /// Bookings whose start instant falls on the given UTC calendar day.
    pub async fn bookings_on(&self, date: NaiveDate) -> Vec<Booking> {
        self.collect_bookings(|b| date_of(b.span.start) == Some(date))
            .await
    }

    pub async fn get_booking(&self, id: BookingId) -> Option<Booking> {
        let room_id = self.room_for_booking(&id)?;
        let rs = self.get_room(&room_id)?;
        let guard = rs.read().await;
        guard.get_booking(id).copied()
    }

    /// Like `get_booking` but with a typed failure for callers that treat a
    /// missing booking as an error.
    pub async fn require_booking(&self, id: BookingId) -> Result<Booking, EngineError> {
        self.get_booking(id)
            .await
            .ok_or(EngineError::BookingNotFound(id))
    }

    async fn collect_bookings(&self, keep: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let states: Vec<_> = self.rooms.iter().map(|e| e.value().clone()).collect();
        let mut bookings = Vec::new();
        for rs in states {
            let guard = rs.read().await;
            bookings.extend(guard.bookings.iter().filter(|b| keep(b)).copied());
        }
        bookings.sort_by_key(|b| b.id);
        bookings
    }
}
