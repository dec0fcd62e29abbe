use crate::model::Ms;

pub const MAX_NAME_LEN: usize = 256;
pub const MAX_EMAIL_LEN: usize = 320;
pub const MAX_LOCATION_LEN: usize = 256;

pub const MAX_USERS: usize = 100_000;
pub const MAX_ROOMS: usize = 10_000;
pub const MAX_BOOKINGS_PER_ROOM: usize = 100_000;

/// 1970-01-01T00:00:00Z.
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
/// 2100-01-01T00:00:00Z.
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;
/// One week. A single meeting longer than this is an input error.
pub const MAX_SPAN_DURATION_MS: Ms = 7 * 24 * 3_600_000;
