use chrono::{DateTime, Utc};
use uuid::Uuid;

use vellum_api::domain::{Cursor, SortField};

fn at_micros(us: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(us).expect("in range")
}

#[test]
fn the_blob_round_trips_unchanged() {
    for sort_field in [SortField::CreatedAt, SortField::LastModifiedAt] {
        let cursor = Cursor {
            sort_field,
            last_seen_time: at_micros(1_720_000_555_123_456),
            last_seen_id: Uuid::new_v4(),
        };
        let blob = cursor.encode();
        let decoded = Cursor::decode(&blob).expect("decode");
        assert_eq!(decoded, cursor);
        // Clients treat the blob as opaque; re-encoding yields the same blob.
        assert_eq!(decoded.encode(), blob);
    }
}

#[test]
fn the_beginning_cursor_sits_above_every_row() {
    let cursor = Cursor::beginning(SortField::CreatedAt);
    assert_eq!(cursor.last_seen_id, Uuid::max());
    // Any row written before the cursor was minted qualifies.
    assert!(cursor.admits(at_micros(0), Uuid::new_v4()));
    assert!(cursor.admits(cursor.last_seen_time, Uuid::new_v4()));
}

#[test]
fn malformed_blobs_are_rejected() {
    for blob in ["", "!!!", "dG9vIHNob3J0", &"A".repeat(64)] {
        assert!(
            Cursor::decode(blob).is_err(),
            "blob {blob:?} should not decode"
        );
    }
}

#[test]
fn cursor_ordering_matches_keyset_semantics() {
    let boundary_id = Uuid::new_v4();
    let cursor = Cursor {
        sort_field: SortField::LastModifiedAt,
        last_seen_time: at_micros(2_000_000),
        last_seen_id: boundary_id,
    };

    // Strictly older time: admitted regardless of id.
    assert!(cursor.admits(at_micros(1_999_999), Uuid::max()));
    // Equal time: only ids below the boundary.
    assert!(!cursor.admits(at_micros(2_000_000), boundary_id));
    assert!(!cursor.admits(at_micros(2_000_000), Uuid::max()));
    // Newer time: never admitted.
    assert!(!cursor.admits(at_micros(2_000_001), Uuid::nil()));
}
