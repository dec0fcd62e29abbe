use serde::{Deserialize, Serialize};

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Sequential entity ids. Assigned by the engine, monotonic, never reused
/// while the journal still records the entity's creation.
pub type UserId = u64;
pub type RoomId = u64;
pub type BookingId = u64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// Touching endpoints (one span ending exactly when the other starts)
    /// do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Opaque string, not validated for format.
    pub email: String,
}

/// Room metadata as returned by queries. Live per-room state (including its
/// bookings) lives in [`RoomState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
    pub location: Option<String>,
}

/// A booking references its room and user by id — it does not own them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub span: Span,
}

/// Per-room mutable state: the room's fields plus its bookings, kept sorted
/// by `span.start` so conflict checks can skip non-overlapping tails.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
    pub location: Option<String>,
    pub bookings: Vec<Booking>,
}

impl RoomState {
    pub fn new(id: RoomId, name: String, capacity: u32, location: Option<String>) -> Self {
        Self {
            id,
            name,
            capacity,
            location,
            bookings: Vec::new(),
        }
    }

    pub fn info(&self) -> Room {
        Room {
            id: self.id,
            name: self.name.clone(),
            capacity: self.capacity,
            location: self.location.clone(),
        }
    }

    /// Insert a booking maintaining sort order by span.start.
    pub fn insert_booking(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .binary_search_by_key(&booking.span.start, |b| b.span.start)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    /// Remove a booking by id.
    pub fn remove_booking(&mut self, id: BookingId) -> Option<Booking> {
        if let Some(pos) = self.bookings.iter().position(|b| b.id == id) {
            Some(self.bookings.remove(pos))
        } else {
            None
        }
    }

    pub fn get_booking(&self, id: BookingId) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    /// Return only bookings whose span overlaps the query window.
    /// Uses binary search to skip bookings starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &Booking> {
        let right_bound = self
            .bookings
            .partition_point(|b| b.span.start < query.end);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.span.end > query.start)
    }
}

/// The event types — flat, no nesting. This is the journal record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    UserCreated {
        id: UserId,
        name: String,
        email: String,
    },
    UserDeleted {
        id: UserId,
    },
    RoomCreated {
        id: RoomId,
        name: String,
        capacity: u32,
        location: Option<String>,
    },
    RoomDeleted {
        id: RoomId,
    },
    BookingCreated {
        id: BookingId,
        room_id: RoomId,
        user_id: UserId,
        span: Span,
    },
    BookingCancelled {
        id: BookingId,
        room_id: RoomId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(id: BookingId, start: Ms, end: Ms) -> Booking {
        Booking {
            id,
            room_id: 1,
            user_id: 1,
            span: Span::new(start, end),
        }
    }

    #[test]
    fn span_basics() {
        let s = Span::new(100, 200);
        assert_eq!(s.duration_ms(), 100);
        assert!(s.contains_instant(100));
        assert!(s.contains_instant(199));
        assert!(!s.contains_instant(200)); // half-open
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        let c = Span::new(200, 300);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn booking_ordering() {
        let mut rs = RoomState::new(1, "A".into(), 4, None);
        rs.insert_booking(booking(1, 300, 400));
        rs.insert_booking(booking(2, 100, 200));
        rs.insert_booking(booking(3, 200, 300));
        assert_eq!(rs.bookings[0].span.start, 100);
        assert_eq!(rs.bookings[1].span.start, 200);
        assert_eq!(rs.bookings[2].span.start, 300);
    }

    #[test]
    fn booking_remove() {
        let mut rs = RoomState::new(1, "A".into(), 4, None);
        rs.insert_booking(booking(1, 100, 200));
        assert_eq!(rs.bookings.len(), 1);
        assert_eq!(rs.remove_booking(1).map(|b| b.id), Some(1));
        assert!(rs.bookings.is_empty());
    }

    #[test]
    fn remove_nonexistent_returns_none() {
        let mut rs = RoomState::new(1, "A".into(), 4, None);
        rs.insert_booking(booking(1, 100, 200));
        assert!(rs.remove_booking(42).is_none());
        assert_eq!(rs.bookings.len(), 1); // original still there
    }

    #[test]
    fn remove_middle_preserves_order() {
        let mut rs = RoomState::new(1, "A".into(), 4, None);
        for i in 0..3u64 {
            rs.insert_booking(booking(i + 1, (i as Ms) * 100, (i as Ms) * 100 + 50));
        }
        rs.remove_booking(2); // remove middle
        assert_eq!(rs.bookings.len(), 2);
        assert_eq!(rs.bookings[0].id, 1);
        assert_eq!(rs.bookings[1].id, 3);
    }

    #[test]
    fn overlapping_skips_non_intersecting() {
        let mut rs = RoomState::new(1, "A".into(), 4, None);
        rs.insert_booking(booking(1, 100, 200)); // past
        rs.insert_booking(booking(2, 450, 600)); // overlaps
        rs.insert_booking(booking(3, 1000, 1100)); // starts after query end

        let query = Span::new(500, 800);
        let hits: Vec<_> = rs.overlapping(&query).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);
    }

    #[test]
    fn overlapping_adjacent_not_included() {
        // Booking ending exactly at query.start is NOT overlapping (half-open)
        let mut rs = RoomState::new(1, "A".into(), 4, None);
        rs.insert_booking(booking(1, 100, 200));
        let query = Span::new(200, 300);
        assert!(rs.overlapping(&query).next().is_none());
    }

    #[test]
    fn overlapping_spanning_booking_found() {
        let mut rs = RoomState::new(1, "A".into(), 4, None);
        rs.insert_booking(booking(1, 0, 10_000));
        let query = Span::new(500, 600);
        let hits: Vec<_> = rs.overlapping(&query).collect();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn overlapping_empty_room() {
        let rs = RoomState::new(1, "A".into(), 4, None);
        assert!(rs.overlapping(&Span::new(0, 1000)).next().is_none());
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = Event::BookingCreated {
            id: 7,
            room_id: 2,
            user_id: 3,
            span: Span::new(1000, 2000),
        };
        let bytes = bincode::serialize(&event).unwrap();
        let decoded: Event = bincode::deserialize(&bytes).unwrap();
        assert_eq!(event, decoded);
    }
}
