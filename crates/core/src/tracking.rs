//! Display-id generation for service records.
//!
//! A display id is the externally visible tracking code quoted back to the
//! guest and shown on the dashboard: `RES-201-7G2KQ9` for a restaurant
//! order, `ROS-301-X4TB08` for a room-service request. The format is a
//! stable contract; dashboards and invoices parse it.

use crate::domain::room::RoomNumber;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayId(pub String);

impl DisplayId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub const DISPLAY_SUFFIX_LEN: usize = 6;

/// Upper bound on generation retries before giving up. Six alphanumeric
/// characters give 36^6 combinations, so hitting this bound means the
/// uniqueness check itself is broken.
pub const MAX_GENERATION_ATTEMPTS: usize = 32;

const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// One random candidate in the display-id format. Uniqueness is enforced by
/// the store's unique index; callers regenerate on conflict, bounded by
/// [`MAX_GENERATION_ATTEMPTS`].
pub fn candidate_display_id(prefix: &str, room: &RoomNumber) -> DisplayId {
    candidate_display_id_with(prefix, room, &mut rand::thread_rng())
}

pub fn candidate_display_id_with<R: Rng>(prefix: &str, room: &RoomNumber, rng: &mut R) -> DisplayId {
    let mut suffix = String::with_capacity(DISPLAY_SUFFIX_LEN);
    for _ in 0..DISPLAY_SUFFIX_LEN {
        let index = rng.gen_range(0..SUFFIX_CHARSET.len());
        suffix.push(SUFFIX_CHARSET[index] as char);
    }
    DisplayId(format!("{}-{}-{}", prefix, room.as_str(), suffix))
}
