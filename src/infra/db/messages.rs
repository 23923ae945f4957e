use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{MessagesRepo, RepoError},
    domain::entities::Message,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    conversation_id: Uuid,
    sender_id: Uuid,
    body: String,
    read: bool,
    created_at: OffsetDateTime,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            conversation_id: row.conversation_id,
            sender_id: row.sender_id,
            body: row.body,
            read: row.read,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl MessagesRepo for PostgresRepositories {
    async fn list_messages(
        &self,
        conversation_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Message>, RepoError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, conversation_id, sender_id, body, read, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(conversation_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn insert_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<Message, RepoError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (conversation_id, sender_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, conversation_id, sender_id, body, read, created_at
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(body)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn mark_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET read = TRUE
            WHERE conversation_id = $1 AND sender_id <> $2 AND read = FALSE
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
