//! Keyset cursor for paginated listings, plus its opaque wire encoding.
//!
//! A cursor is an exclusive position in the total order on
//! `(sort_field DESC, id DESC)`: a row `(t, id)` belongs to the next page iff
//! `t < last_seen_time` or `t == last_seen_time && id < last_seen_id`. This
//! stays stable under concurrent inserts and deletes, which is why listings
//! use it instead of offset pagination.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Which timestamp column a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CreatedAt,
    LastModifiedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub sort_field: SortField,
    pub last_seen_time: DateTime<Utc>,
    pub last_seen_id: Uuid,
}

// Wire layout: 1 byte sort-field tag, 8 bytes big-endian microsecond
// timestamp, 16 bytes id. Timestamps are microsecond precision, matching the
// store.
const WIRE_LEN: usize = 1 + 8 + 16;

const TAG_CREATED_AT: u8 = 0;
const TAG_LAST_MODIFIED_AT: u8 = 1;

impl Cursor {
    /// A cursor positioned before any stored row: the current time paired
    /// with the maximum representable id compares greater than everything.
    pub fn beginning(sort_field: SortField) -> Self {
        Self {
            sort_field,
            last_seen_time: Utc::now(),
            last_seen_id: Uuid::max(),
        }
    }

    /// Encode to the opaque URL-safe blob clients round-trip unchanged.
    pub fn encode(&self) -> String {
        let mut wire = [0u8; WIRE_LEN];
        wire[0] = match self.sort_field {
            SortField::CreatedAt => TAG_CREATED_AT,
            SortField::LastModifiedAt => TAG_LAST_MODIFIED_AT,
        };
        wire[1..9].copy_from_slice(&self.last_seen_time.timestamp_micros().to_be_bytes());
        wire[9..25].copy_from_slice(self.last_seen_id.as_bytes());
        URL_SAFE_NO_PAD.encode(wire)
    }

    /// Decode a client-supplied blob. Anything malformed is `InvalidInput`:
    /// the blob is client input, not trusted state.
    pub fn decode(blob: &str) -> Result<Self, DomainError> {
        let wire = URL_SAFE_NO_PAD
            .decode(blob)
            .map_err(|_| DomainError::invalid_input("cursor is not valid base64"))?;
        if wire.len() != WIRE_LEN {
            return Err(DomainError::invalid_input(format!(
                "cursor has wrong length: expected {} bytes, got {}",
                WIRE_LEN,
                wire.len()
            )));
        }
        let sort_field = match wire[0] {
            TAG_CREATED_AT => SortField::CreatedAt,
            TAG_LAST_MODIFIED_AT => SortField::LastModifiedAt,
            other => {
                return Err(DomainError::invalid_input(format!(
                    "cursor has unknown sort field tag: {other}"
                )))
            }
        };
        let micros = i64::from_be_bytes(wire[1..9].try_into().expect("slice is 8 bytes"));
        let last_seen_time = DateTime::from_timestamp_micros(micros)
            .ok_or_else(|| DomainError::invalid_input("cursor timestamp is out of range"))?;
        let last_seen_id = Uuid::from_slice(&wire[9..25]).expect("slice is 16 bytes");
        Ok(Self {
            sort_field,
            last_seen_time,
            last_seen_id,
        })
    }

    /// True when `(t, id)` sits strictly behind this cursor, i.e. belongs to
    /// the page this cursor continues into.
    pub fn admits(&self, t: DateTime<Utc>, id: Uuid) -> bool {
        t < self.last_seen_time || (t == self.last_seen_time && id < self.last_seen_id)
    }
}
