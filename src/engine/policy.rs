use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::limits::*;
use crate::model::{Booking, Ms, Span};

use super::EngineError;

/// Booking admission policy. Pure predicate: no side effects, identical
/// inputs give identical results.
///
/// `candidate` is the booking about to be inserted (id not yet meaningful);
/// `existing` is the booking set the orchestrator fetched for the candidate's
/// room. Bookings for other rooms must be ignored by implementations.
pub trait SchedulingPolicy: Send + Sync {
    fn is_valid(&self, candidate: &Booking, existing: &[Booking]) -> bool;
}

/// Reject any candidate whose half-open span intersects an existing booking
/// in the same room. Touching endpoints are allowed.
pub struct NoOverlap;

impl SchedulingPolicy for NoOverlap {
    fn is_valid(&self, candidate: &Booking, existing: &[Booking]) -> bool {
        for booking in existing {
            if booking.room_id != candidate.room_id {
                continue;
            }
            if candidate.span.overlaps(&booking.span) {
                return false;
            }
        }
        true
    }
}

const BUSINESS_OPEN_HOUR: u32 = 9;
const BUSINESS_CLOSE_HOUR: u32 = 18;

fn wall_clock(ms: Ms) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
}

/// Only admit bookings lying within business hours (09:00–18:00 UTC).
/// Not wired in by default — present as an alternative strategy.
pub struct BusinessHours;

impl SchedulingPolicy for BusinessHours {
    fn is_valid(&self, candidate: &Booking, _existing: &[Booking]) -> bool {
        let (Some(start), Some(end)) = (
            wall_clock(candidate.span.start),
            wall_clock(candidate.span.end),
        ) else {
            return false;
        };
        // Overnight spans can never sit inside one business day, so hour
        // checks alone are not enough.
        if start.date_naive() != end.date_naive() {
            return false;
        }
        if start.hour() < BUSINESS_OPEN_HOUR || start.hour() >= BUSINESS_CLOSE_HOUR {
            return false;
        }
        // The closing boundary itself (18:00 sharp) is a valid end.
        end.hour() < BUSINESS_CLOSE_HOUR
            || (end.hour() == BUSINESS_CLOSE_HOUR && end.minute() == 0 && end.second() == 0)
    }
}

/// Only admit bookings starting and ending Monday–Friday.
/// Not wired in by default — present as an alternative strategy.
pub struct WeekdayOnly;

impl SchedulingPolicy for WeekdayOnly {
    fn is_valid(&self, candidate: &Booking, _existing: &[Booking]) -> bool {
        let (Some(start), Some(end)) = (
            wall_clock(candidate.span.start),
            wall_clock(candidate.span.end),
        ) else {
            return false;
        };
        // Monday = 0 .. Sunday = 6
        start.weekday().num_days_from_monday() < 5 && end.weekday().num_days_from_monday() < 5
    }
}

/// Chain of policies — every member must accept the candidate.
pub struct AllOf(pub Vec<Box<dyn SchedulingPolicy>>);

impl SchedulingPolicy for AllOf {
    fn is_valid(&self, candidate: &Booking, existing: &[Booking]) -> bool {
        self.0.iter().all(|p| p.is_valid(candidate, existing))
    }
}

/// Structural span checks, applied before any policy runs.
pub(crate) fn validate_span(span: &Span) -> Result<(), EngineError> {
    if span.start >= span.end {
        return Err(EngineError::InvalidRange {
            start: span.start,
            end: span.end,
        });
    }
    if span.start < MIN_VALID_TIMESTAMP_MS || span.end > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::InvalidInput("timestamp out of range"));
    }
    if span.duration_ms() > MAX_SPAN_DURATION_MS {
        return Err(EngineError::InvalidInput("booking span too wide"));
    }
    Ok(())
}
