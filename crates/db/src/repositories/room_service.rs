use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

use concierge_core::domain::record::{RecordId, ServiceStatus};
use concierge_core::domain::room::RoomNumber;
use concierge_core::domain::room_service::{
    NewRoomServiceRequest, RequestType, RoomServiceRequest,
};
use concierge_core::tracking::DisplayId;

use super::{conflict_on_unique, parse_status, parse_timestamp, RepositoryError, RequestRepository};
use crate::DbPool;

pub struct SqlRequestRepository {
    pool: DbPool,
}

impl SqlRequestRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RequestRepository for SqlRequestRepository {
    async fn create(
        &self,
        new_request: NewRoomServiceRequest,
    ) -> Result<RoomServiceRequest, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO room_service_requests (
                display_id,
                room_number,
                request_type,
                status,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_request.display_id.0)
        .bind(&new_request.room_number.0)
        .bind(new_request.request_type.as_str())
        .bind(new_request.status.as_str())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|error| conflict_on_unique(error, "request display id"))?;

        Ok(RoomServiceRequest {
            id: RecordId(result.last_insert_rowid()),
            display_id: new_request.display_id,
            room_number: new_request.room_number,
            request_type: new_request.request_type,
            status: new_request.status,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_id(
        &self,
        id: RecordId,
    ) -> Result<Option<RoomServiceRequest>, RepositoryError> {
        let row = sqlx::query(
            "SELECT
                id,
                display_id,
                room_number,
                request_type,
                status,
                created_at,
                updated_at
             FROM room_service_requests
             WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(request_from_row).transpose()
    }

    async fn find_by_display_id(
        &self,
        display_id: &DisplayId,
    ) -> Result<Option<RoomServiceRequest>, RepositoryError> {
        let row = sqlx::query(
            "SELECT
                id,
                display_id,
                room_number,
                request_type,
                status,
                created_at,
                updated_at
             FROM room_service_requests
             WHERE display_id = ?",
        )
        .bind(&display_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(request_from_row).transpose()
    }

    async fn update_status(
        &self,
        id: RecordId,
        status: ServiceStatus,
    ) -> Result<RoomServiceRequest, RepositoryError> {
        let result = sqlx::query(
            "UPDATE room_service_requests
             SET status = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("room service request {id}")));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("room service request {id}")))
    }

    async fn list_newest_first(&self) -> Result<Vec<RoomServiceRequest>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT
                id,
                display_id,
                room_number,
                request_type,
                status,
                created_at,
                updated_at
             FROM room_service_requests
             ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(request_from_row).collect()
    }
}

fn request_from_row(row: SqliteRow) -> Result<RoomServiceRequest, RepositoryError> {
    let request_type_raw = row.try_get::<String, _>("request_type")?;
    let request_type = RequestType::parse(&request_type_raw).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown request type `{request_type_raw}`"))
    })?;

    let status_raw = row.try_get::<String, _>("status")?;

    Ok(RoomServiceRequest {
        id: RecordId(row.try_get("id")?),
        display_id: DisplayId(row.try_get("display_id")?),
        room_number: RoomNumber(row.try_get("room_number")?),
        request_type,
        status: parse_status("status", &status_raw)?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use concierge_core::domain::record::{RecordId, ServiceStatus};
    use concierge_core::domain::room::RoomNumber;
    use concierge_core::domain::room_service::{NewRoomServiceRequest, RequestType};
    use concierge_core::tracking::DisplayId;

    use super::SqlRequestRepository;
    use crate::migrations;
    use crate::repositories::RequestRepository;
    use crate::{connect_with_settings, DbPool};

    #[tokio::test]
    async fn sql_request_repo_round_trips_a_request() {
        let pool = setup_pool().await;
        let repo = SqlRequestRepository::new(pool.clone());

        let created =
            repo.create(sample_request("ROS-305-REQ001")).await.expect("create request");
        assert!(created.id.0 > 0);
        assert_eq!(created.request_type, RequestType::Laundry);

        let found = repo.find_by_id(created.id).await.expect("find request");
        assert_eq!(found, Some(created.clone()));

        let by_display = repo
            .find_by_display_id(&DisplayId("ROS-305-REQ001".to_string()))
            .await
            .expect("find by display id");
        assert_eq!(by_display, Some(created));

        pool.close().await;
    }

    #[tokio::test]
    async fn sql_request_repo_rejects_duplicate_display_ids() {
        let pool = setup_pool().await;
        let repo = SqlRequestRepository::new(pool.clone());

        repo.create(sample_request("ROS-305-DUP001")).await.expect("first create");
        let error =
            repo.create(sample_request("ROS-305-DUP001")).await.expect_err("duplicate create");

        assert!(error.is_conflict(), "expected conflict, got {error:?}");

        pool.close().await;
    }

    #[tokio::test]
    async fn sql_request_repo_walks_the_full_lifecycle() {
        let pool = setup_pool().await;
        let repo = SqlRequestRepository::new(pool.clone());

        let created =
            repo.create(sample_request("ROS-305-LIF001")).await.expect("create request");

        let in_progress = repo
            .update_status(created.id, ServiceStatus::InProgress)
            .await
            .expect("to in progress");
        assert_eq!(in_progress.status, ServiceStatus::InProgress);

        let completed =
            repo.update_status(created.id, ServiceStatus::Completed).await.expect("to completed");
        assert_eq!(completed.status, ServiceStatus::Completed);

        pool.close().await;
    }

    #[tokio::test]
    async fn sql_request_repo_reports_missing_rows_as_not_found() {
        let pool = setup_pool().await;
        let repo = SqlRequestRepository::new(pool.clone());

        let error = repo
            .update_status(RecordId(881_188), ServiceStatus::Cancelled)
            .await
            .expect_err("update missing request");
        assert!(error.is_not_found(), "expected not found, got {error:?}");

        pool.close().await;
    }

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn sample_request(display_id: &str) -> NewRoomServiceRequest {
        NewRoomServiceRequest {
            display_id: DisplayId(display_id.to_string()),
            room_number: RoomNumber("305".to_string()),
            request_type: RequestType::Laundry,
            status: ServiceStatus::Pending,
        }
    }
}
