use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

use concierge_core::domain::conversation::{
    ConversationId, ConversationTurn, NewConversationTurn, Sender,
};
use concierge_core::domain::department::Department;
use concierge_core::domain::room::RoomNumber;
use concierge_core::domain::session::GuestSession;

use super::{parse_timestamp, ConversationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlConversationRepository {
    pool: DbPool,
}

impl SqlConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ConversationRepository for SqlConversationRepository {
    async fn find_session(
        &self,
        id: &ConversationId,
    ) -> Result<Option<GuestSession>, RepositoryError> {
        let row = sqlx::query(
            "SELECT
                conversation_id,
                room_number,
                created_at,
                updated_at
             FROM guest_sessions
             WHERE conversation_id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(session_from_row).transpose()
    }

    async fn save_session(&self, session: GuestSession) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO guest_sessions (
                conversation_id,
                room_number,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?)
             ON CONFLICT(conversation_id) DO UPDATE SET
                room_number = excluded.room_number,
                updated_at = excluded.updated_at",
        )
        .bind(&session.conversation_id.0)
        .bind(session.room_number.as_ref().map(RoomNumber::as_str))
        .bind(session.created_at.to_rfc3339())
        .bind(session.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn append_turn(
        &self,
        turn: NewConversationTurn,
    ) -> Result<ConversationTurn, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO conversation_messages (
                conversation_id,
                sender,
                department,
                content,
                created_at
             ) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&turn.conversation_id.0)
        .bind(turn.sender.as_str())
        .bind(turn.department.as_ref().map(Department::as_str))
        .bind(&turn.content)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(ConversationTurn {
            id: result.last_insert_rowid(),
            conversation_id: turn.conversation_id,
            sender: turn.sender,
            department: turn.department,
            content: turn.content,
            created_at: now,
        })
    }

    async fn list_turns(
        &self,
        id: &ConversationId,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT
                id,
                conversation_id,
                sender,
                department,
                content,
                created_at
             FROM conversation_messages
             WHERE conversation_id = ?
             ORDER BY id ASC",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(turn_from_row).collect()
    }

    async fn last_agent_department(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Department>, RepositoryError> {
        let row = sqlx::query(
            "SELECT department
             FROM conversation_messages
             WHERE conversation_id = ? AND sender = 'agent' AND department IS NOT NULL
             ORDER BY id DESC
             LIMIT 1",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let raw = row.try_get::<String, _>("department")?;
            Department::parse(&raw)
                .ok_or_else(|| RepositoryError::Decode(format!("unknown department `{raw}`")))
        })
        .transpose()
    }
}

fn session_from_row(row: SqliteRow) -> Result<GuestSession, RepositoryError> {
    Ok(GuestSession {
        conversation_id: ConversationId(row.try_get("conversation_id")?),
        room_number: row.try_get::<Option<String>, _>("room_number")?.map(RoomNumber),
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}

fn turn_from_row(row: SqliteRow) -> Result<ConversationTurn, RepositoryError> {
    let sender_raw = row.try_get::<String, _>("sender")?;
    let sender = Sender::parse(&sender_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown sender `{sender_raw}`")))?;

    let department = row
        .try_get::<Option<String>, _>("department")?
        .map(|raw| {
            Department::parse(&raw)
                .ok_or_else(|| RepositoryError::Decode(format!("unknown department `{raw}`")))
        })
        .transpose()?;

    Ok(ConversationTurn {
        id: row.try_get("id")?,
        conversation_id: ConversationId(row.try_get("conversation_id")?),
        sender,
        department,
        content: row.try_get("content")?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}
