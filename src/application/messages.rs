use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{MessagesRepo, RepoError};
use crate::cache::{CatalogCaches, InvalidationCoordinator, scoped_list_key};
use crate::domain::entities::Message;

pub const DEFAULT_WINDOW_LIMIT: u32 = 20;
pub const MAX_WINDOW_LIMIT: u32 = 100;
const MAX_BODY_CHARS: usize = 4000;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// One window of a conversation, newest message first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

#[derive(Clone)]
pub struct MessageService {
    repo: Arc<dyn MessagesRepo>,
    caches: Arc<CatalogCaches>,
    invalidation: Arc<InvalidationCoordinator>,
}

impl MessageService {
    pub fn new(repo: Arc<dyn MessagesRepo>, invalidation: Arc<InvalidationCoordinator>) -> Self {
        Self {
            repo,
            caches: invalidation.caches().clone(),
            invalidation,
        }
    }

    pub async fn window(
        &self,
        conversation_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<MessagePage, MessageError> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_WINDOW_LIMIT);
        let key = scoped_list_key(&conversation_id.to_string(), page, limit);

        if let Some(cached) = self.caches.messages.get(&key) {
            return Ok(cached);
        }

        let epoch = self.caches.messages.epoch();
        let offset = u64::from(page - 1) * u64::from(limit);
        // One extra row tells whether another window follows.
        let mut messages = self
            .repo
            .list_messages(conversation_id, offset, u64::from(limit) + 1)
            .await?;
        let has_more = messages.len() > limit as usize;
        messages.truncate(limit as usize);

        let window = MessagePage {
            messages,
            page,
            limit,
            has_more,
        };
        self.caches
            .messages
            .set_if_epoch(epoch, key, window.clone(), None);
        Ok(window)
    }

    pub async fn send(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<Message, MessageError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(MessageError::ConstraintViolation("message body must not be empty"));
        }
        if body.chars().count() > MAX_BODY_CHARS {
            return Err(MessageError::ConstraintViolation("message body is too long"));
        }

        let message = self
            .repo
            .insert_message(conversation_id, sender_id, body)
            .await?;
        self.invalidation.conversation_changed(conversation_id);
        Ok(message)
    }

    /// Mark the other party's messages read. Returns how many changed.
    pub async fn mark_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64, MessageError> {
        let updated = self.repo.mark_read(conversation_id, reader_id).await?;
        if updated > 0 {
            self.invalidation.conversation_changed(conversation_id);
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use time::OffsetDateTime;
    use tokio::sync::Mutex;

    use super::*;
    use crate::cache::CacheConfig;

    #[derive(Default)]
    struct MemoryMessages {
        rows: Mutex<Vec<Message>>,
        list_calls: Mutex<usize>,
    }

    #[async_trait]
    impl MessagesRepo for MemoryMessages {
        async fn list_messages(
            &self,
            conversation_id: Uuid,
            offset: u64,
            limit: u64,
        ) -> Result<Vec<Message>, RepoError> {
            *self.list_calls.lock().await += 1;
            let rows = self.rows.lock().await;
            let mut matching: Vec<Message> = rows
                .iter()
                .filter(|message| message.conversation_id == conversation_id)
                .cloned()
                .collect();
            matching.reverse();
            Ok(matching
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect())
        }

        async fn insert_message(
            &self,
            conversation_id: Uuid,
            sender_id: Uuid,
            body: &str,
        ) -> Result<Message, RepoError> {
            let message = Message {
                id: Uuid::new_v4(),
                conversation_id,
                sender_id,
                body: body.to_string(),
                read: false,
                created_at: OffsetDateTime::now_utc(),
            };
            self.rows.lock().await.push(message.clone());
            Ok(message)
        }

        async fn mark_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64, RepoError> {
            let mut updated = 0;
            for message in self.rows.lock().await.iter_mut() {
                if message.conversation_id == conversation_id
                    && message.sender_id != reader_id
                    && !message.read
                {
                    message.read = true;
                    updated += 1;
                }
            }
            Ok(updated)
        }
    }

    fn service() -> (MessageService, Arc<MemoryMessages>) {
        let config = CacheConfig::default();
        let caches = Arc::new(CatalogCaches::new(&config));
        let invalidation = Arc::new(InvalidationCoordinator::new(&config, caches));
        let repo = Arc::new(MemoryMessages::default());
        (MessageService::new(repo.clone(), invalidation), repo)
    }

    #[tokio::test]
    async fn window_is_cached_until_a_message_is_sent() {
        let (service, repo) = service();
        let conversation = Uuid::new_v4();
        let sender = Uuid::new_v4();
        service.send(conversation, sender, "merhaba").await.expect("send");

        let first = service.window(conversation, 1, 20).await.expect("window");
        let second = service.window(conversation, 1, 20).await.expect("window");
        assert_eq!(first, second);
        assert_eq!(*repo.list_calls.lock().await, 1);

        service.send(conversation, sender, "hala satılık mı?").await.expect("send");
        let third = service.window(conversation, 1, 20).await.expect("window");
        assert_eq!(third.messages.len(), 2);
        assert_eq!(third.messages[0].body, "hala satılık mı?");
        assert_eq!(*repo.list_calls.lock().await, 2);
    }

    #[tokio::test]
    async fn window_reports_more_and_clamps_limit() {
        let (service, _) = service();
        let conversation = Uuid::new_v4();
        let sender = Uuid::new_v4();
        for i in 0..3 {
            service
                .send(conversation, sender, &format!("message {i}"))
                .await
                .expect("send");
        }

        let window = service.window(conversation, 0, 2).await.expect("window");
        assert_eq!(window.page, 1);
        assert_eq!(window.messages.len(), 2);
        assert!(window.has_more);

        let clamped = service.window(conversation, 1, 0).await.expect("window");
        assert_eq!(clamped.limit, 1);

        let last = service.window(conversation, 2, 2).await.expect("window");
        assert_eq!(last.messages.len(), 1);
        assert!(!last.has_more);
    }

    #[tokio::test]
    async fn mark_read_refreshes_read_state() {
        let (service, _) = service();
        let conversation = Uuid::new_v4();
        let seller = Uuid::new_v4();
        let buyer = Uuid::new_v4();
        service.send(conversation, seller, "fiyat sabit").await.expect("send");

        let before = service.window(conversation, 1, 20).await.expect("window");
        assert!(!before.messages[0].read);

        assert_eq!(service.mark_read(conversation, buyer).await.expect("mark"), 1);
        let after = service.window(conversation, 1, 20).await.expect("window");
        assert!(after.messages[0].read);
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let (service, _) = service();
        let err = service
            .send(Uuid::new_v4(), Uuid::new_v4(), "   ")
            .await
            .expect_err("blank body");
        assert!(matches!(err, MessageError::ConstraintViolation(_)));
    }
}
