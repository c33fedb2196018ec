use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};

use concierge_core::domain::order::{NewRestaurantOrder, OrderLine, RestaurantOrder};
use concierge_core::domain::record::{RecordId, ServiceStatus};
use concierge_core::domain::room::RoomNumber;
use concierge_core::tracking::DisplayId;

use super::{conflict_on_unique, parse_status, parse_timestamp, OrderRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn create(
        &self,
        new_order: NewRestaurantOrder,
    ) -> Result<RestaurantOrder, RepositoryError> {
        let items_json = serde_json::to_string(&new_order.items)
            .map_err(|error| RepositoryError::Decode(format!("encode order items: {error}")))?;
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO restaurant_orders (
                display_id,
                room_number,
                items,
                total_amount,
                status,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_order.display_id.0)
        .bind(&new_order.room_number.0)
        .bind(&items_json)
        .bind(new_order.total_amount.to_string())
        .bind(new_order.status.as_str())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|error| conflict_on_unique(error, "order display id"))?;

        Ok(RestaurantOrder {
            id: RecordId(result.last_insert_rowid()),
            display_id: new_order.display_id,
            room_number: new_order.room_number,
            items: new_order.items,
            total_amount: new_order.total_amount,
            status: new_order.status,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<RestaurantOrder>, RepositoryError> {
        let row = sqlx::query(
            "SELECT
                id,
                display_id,
                room_number,
                items,
                total_amount,
                status,
                created_at,
                updated_at
             FROM restaurant_orders
             WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(order_from_row).transpose()
    }

    async fn find_by_display_id(
        &self,
        display_id: &DisplayId,
    ) -> Result<Option<RestaurantOrder>, RepositoryError> {
        let row = sqlx::query(
            "SELECT
                id,
                display_id,
                room_number,
                items,
                total_amount,
                status,
                created_at,
                updated_at
             FROM restaurant_orders
             WHERE display_id = ?",
        )
        .bind(&display_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(order_from_row).transpose()
    }

    async fn update_status(
        &self,
        id: RecordId,
        status: ServiceStatus,
    ) -> Result<RestaurantOrder, RepositoryError> {
        let result = sqlx::query(
            "UPDATE restaurant_orders
             SET status = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("restaurant order {id}")));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("restaurant order {id}")))
    }

    async fn list_newest_first(&self) -> Result<Vec<RestaurantOrder>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT
                id,
                display_id,
                room_number,
                items,
                total_amount,
                status,
                created_at,
                updated_at
             FROM restaurant_orders
             ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(order_from_row).collect()
    }
}

fn order_from_row(row: SqliteRow) -> Result<RestaurantOrder, RepositoryError> {
    let items_raw = row.try_get::<String, _>("items")?;
    let items: Vec<OrderLine> = serde_json::from_str(&items_raw)
        .map_err(|error| RepositoryError::Decode(format!("invalid order items: {error}")))?;

    let status_raw = row.try_get::<String, _>("status")?;

    Ok(RestaurantOrder {
        id: RecordId(row.try_get("id")?),
        display_id: DisplayId(row.try_get("display_id")?),
        room_number: RoomNumber(row.try_get("room_number")?),
        items,
        total_amount: parse_decimal("total_amount", &row.try_get::<String, _>("total_amount")?)?,
        status: parse_status("status", &status_raw)?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value).map_err(|error| {
        RepositoryError::Decode(format!("invalid amount in `{column}`: `{value}` ({error})"))
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use concierge_core::domain::order::{order_total, NewRestaurantOrder, OrderLine};
    use concierge_core::domain::record::{RecordId, ServiceStatus};
    use concierge_core::domain::room::RoomNumber;
    use concierge_core::tracking::DisplayId;

    use super::SqlOrderRepository;
    use crate::migrations;
    use crate::repositories::OrderRepository;
    use crate::{connect_with_settings, DbPool};

    #[tokio::test]
    async fn sql_order_repo_round_trips_an_order() {
        let pool = setup_pool().await;
        let repo = SqlOrderRepository::new(pool.clone());

        let created = repo.create(sample_order("RES-201-ORD001")).await.expect("create order");
        assert!(created.id.0 > 0);
        assert_eq!(created.status, ServiceStatus::Pending);
        assert_eq!(created.total_amount, Decimal::new(3350, 2));

        let found = repo.find_by_id(created.id).await.expect("find order");
        assert_eq!(found, Some(created.clone()));

        let by_display = repo
            .find_by_display_id(&DisplayId("RES-201-ORD001".to_string()))
            .await
            .expect("find by display id");
        assert_eq!(by_display, Some(created));

        let missing = repo
            .find_by_display_id(&DisplayId("RES-999-NOPE00".to_string()))
            .await
            .expect("find absent display id");
        assert_eq!(missing, None);

        pool.close().await;
    }

    #[tokio::test]
    async fn sql_order_repo_rejects_duplicate_display_ids() {
        let pool = setup_pool().await;
        let repo = SqlOrderRepository::new(pool.clone());

        repo.create(sample_order("RES-201-DUP001")).await.expect("first create");
        let error =
            repo.create(sample_order("RES-201-DUP001")).await.expect_err("duplicate create");

        assert!(error.is_conflict(), "expected conflict, got {error:?}");

        pool.close().await;
    }

    #[tokio::test]
    async fn sql_order_repo_updates_status_and_touches_updated_at() {
        let pool = setup_pool().await;
        let repo = SqlOrderRepository::new(pool.clone());

        let created = repo.create(sample_order("RES-201-UPD001")).await.expect("create order");
        let updated = repo
            .update_status(created.id, ServiceStatus::InProgress)
            .await
            .expect("update status");

        assert_eq!(updated.status, ServiceStatus::InProgress);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);

        pool.close().await;
    }

    #[tokio::test]
    async fn sql_order_repo_reports_missing_rows_as_not_found() {
        let pool = setup_pool().await;
        let repo = SqlOrderRepository::new(pool.clone());

        let error = repo
            .update_status(RecordId(991_199), ServiceStatus::InProgress)
            .await
            .expect_err("update missing order");
        assert!(error.is_not_found(), "expected not found, got {error:?}");

        let found = repo.find_by_id(RecordId(991_199)).await.expect("find missing order");
        assert_eq!(found, None);

        pool.close().await;
    }

    #[tokio::test]
    async fn sql_order_repo_lists_newest_first() {
        let pool = setup_pool().await;
        let repo = SqlOrderRepository::new(pool.clone());

        let first = repo.create(sample_order("RES-201-LST001")).await.expect("create first");
        let second = repo.create(sample_order("RES-201-LST002")).await.expect("create second");

        let listed = repo.list_newest_first().await.expect("list orders");
        let own: Vec<_> =
            listed.into_iter().filter(|order| [first.id, second.id].contains(&order.id)).collect();

        assert_eq!(own.len(), 2);
        assert_eq!(own[0].id, second.id, "newest order should come first");
        assert_eq!(own[1].id, first.id);

        pool.close().await;
    }

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn sample_order(display_id: &str) -> NewRestaurantOrder {
        let items = vec![
            OrderLine {
                name: "Margherita Pizza".to_string(),
                quantity: 2,
                unit_price: Decimal::new(1200, 2),
            },
            OrderLine {
                name: "Fresh Juice".to_string(),
                quantity: 1,
                unit_price: Decimal::new(950, 2),
            },
        ];
        let total = order_total(&items);
        NewRestaurantOrder {
            display_id: DisplayId(display_id.to_string()),
            room_number: RoomNumber("201".to_string()),
            items,
            total_amount: total,
            status: ServiceStatus::Pending,
        }
    }
}
