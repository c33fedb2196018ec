pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod seed;

pub use connection::{connect, connect_with_settings, DbPool};
pub use seed::{room_count, seed_rooms, SeedSummary};
