use crate::model::{BookingId, Ms, RoomId, Span, UserId};

#[derive(Debug)]
pub enum EngineError {
    UserNotFound(UserId),
    RoomNotFound(RoomId),
    BookingNotFound(BookingId),
    /// Candidate span conflicts with an existing booking in the same room.
    Overlap { room_id: RoomId, span: Span },
    InvalidRange { start: Ms, end: Ms },
    InvalidInput(&'static str),
    Journal(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::UserNotFound(id) => write!(f, "user not found: {id}"),
            EngineError::RoomNotFound(id) => write!(f, "room not found: {id}"),
            EngineError::BookingNotFound(id) => write!(f, "booking not found: {id}"),
            EngineError::Overlap { room_id, span } => write!(
                f,
                "time slot [{}, {}) overlaps an existing booking in room {room_id}",
                span.start, span.end
            ),
            EngineError::InvalidRange { start, end } => {
                write!(f, "invalid time range: start {start} must be before end {end}")
            }
            EngineError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            EngineError::Journal(e) => write!(f, "journal error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
