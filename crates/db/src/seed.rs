use serde::Serialize;
use sqlx::Row;

use concierge_core::domain::room::seed_room_numbers;

use crate::repositories::RepositoryError;
use crate::DbPool;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub rooms_inserted: usize,
    pub rooms_total: usize,
}

/// Seeds the fixed room inventory inside one transaction. Rooms that already
/// exist are left untouched, so a re-run never resets an `available` flag
/// that a booking flipped; startup can call this unconditionally.
pub async fn seed_rooms(pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
    let room_numbers = seed_room_numbers();
    let mut tx = pool.begin().await?;

    let mut inserted = 0usize;
    for room_number in &room_numbers {
        let result =
            sqlx::query("INSERT OR IGNORE INTO rooms (room_number, available) VALUES (?, 1)")
                .bind(room_number.as_str())
                .execute(&mut *tx)
                .await?;
        inserted += result.rows_affected() as usize;
    }
    tx.commit().await?;

    Ok(SeedSummary { rooms_inserted: inserted, rooms_total: room_numbers.len() })
}

/// Number of rooms currently in the store.
pub async fn room_count(pool: &DbPool) -> Result<i64, RepositoryError> {
    let count = sqlx::query("SELECT COUNT(*) AS count FROM rooms")
        .fetch_one(pool)
        .await?
        .get::<i64, _>("count");
    Ok(count)
}
