use sqlx::{sqlite::SqliteRow, Row};

use concierge_core::domain::room::{Room, RoomNumber};

use super::{RepositoryError, RoomRepository};
use crate::DbPool;

pub struct SqlRoomRepository {
    pool: DbPool,
}

impl SqlRoomRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RoomRepository for SqlRoomRepository {
    async fn find(&self, room_number: &RoomNumber) -> Result<Option<Room>, RepositoryError> {
        let row = sqlx::query(
            "SELECT room_number, available
             FROM rooms
             WHERE room_number = ?",
        )
        .bind(&room_number.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(room_from_row).transpose()
    }

    async fn list_available(&self) -> Result<Vec<Room>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT room_number, available
             FROM rooms
             WHERE available = 1
             ORDER BY room_number ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(room_from_row).collect()
    }
}

fn room_from_row(row: SqliteRow) -> Result<Room, RepositoryError> {
    Ok(Room {
        room_number: RoomNumber(row.try_get("room_number")?),
        available: row.try_get::<i64, _>("available")? != 0,
    })
}

#[cfg(test)]
mod tests {
    use concierge_core::domain::room::RoomNumber;

    use super::SqlRoomRepository;
    use crate::migrations;
    use crate::repositories::RoomRepository;
    use crate::{connect_with_settings, DbPool};

    #[tokio::test]
    async fn sql_room_repo_finds_known_rooms() {
        let pool = setup_pool().await;
        let repo = SqlRoomRepository::new(pool.clone());

        let room = repo
            .find(&RoomNumber("101".to_string()))
            .await
            .expect("query room")
            .expect("room exists");
        assert!(room.available);

        let missing = repo.find(&RoomNumber("555".to_string())).await.expect("query missing");
        assert_eq!(missing, None);

        pool.close().await;
    }

    #[tokio::test]
    async fn sql_room_repo_lists_only_available_rooms_in_order() {
        let pool = setup_pool().await;
        let repo = SqlRoomRepository::new(pool.clone());

        let available = repo.list_available().await.expect("list available");
        let numbers: Vec<&str> =
            available.iter().map(|room| room.room_number.as_str()).collect();

        assert_eq!(numbers, vec!["101", "103"]);
        assert!(available.iter().all(|room| room.available));

        pool.close().await;
    }

    async fn setup_pool() -> DbPool {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");

        for (number, available) in [("101", 1), ("102", 0), ("103", 1)] {
            sqlx::query("INSERT INTO rooms (room_number, available) VALUES (?, ?)")
                .bind(number)
                .bind(available)
                .execute(&pool)
                .await
                .expect("insert room");
        }

        pool
    }
}
