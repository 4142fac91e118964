// Identifier helpers.
//
// User ids are UUIDv7 so rows sort by creation time. Token ids (`jti`) are
// random UUIDv4.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Generate an opaque local user identifier.
pub fn new_user_id() -> String {
    uuidv7().simple().to_string()
}

/// Generate a unique token identifier for the `jti` claim.
pub fn new_token_id() -> String {
    Uuid::new_v4().to_string()
}
