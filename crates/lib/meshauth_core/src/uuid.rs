// Helper for generating UUIDv7 (timestamp-sortable UUIDs)
//
// User ids are generated app-side so the PostgreSQL and in-memory stores
// hand out the same id format.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}
