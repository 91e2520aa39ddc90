use contracts::usecases::u508_book_item_creation::{ProgressPayload, PROGRESS_EVENT};
use tokio::sync::broadcast;

/// Сообщение для realtime-подписчиков (SSE)
#[derive(Debug, Clone)]
pub struct RealtimeMessage {
    pub event: &'static str,
    pub data: String,
}

/// Рассылка событий прогресса всем подключённым клиентам
#[derive(Clone)]
pub struct RealtimeHub {
    tx: broadcast::Sender<RealtimeMessage>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeMessage> {
        self.tx.subscribe()
    }

    /// Опубликовать прогресс; возвращает число получателей
    pub fn publish_progress(&self, payload: &ProgressPayload) -> usize {
        let data = match serde_json::to_string(payload) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Failed to serialize progress event: {}", e);
                return 0;
            }
        };
        match self.tx.send(RealtimeMessage {
            event: PROGRESS_EVENT,
            data,
        }) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::debug!("No realtime subscribers for {}", payload.docname());
                0
            }
        }
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::usecases::u508_book_item_creation::ProgressSnapshot;

    #[tokio::test]
    async fn test_subscribers_receive_progress() {
        let hub = RealtimeHub::new(8);
        let payload = ProgressPayload::counts("BIC-00001", ProgressSnapshot::new(1, 0, 3).unwrap());
        assert_eq!(hub.publish_progress(&payload), 0);

        let mut rx = hub.subscribe();
        assert_eq!(hub.publish_progress(&payload), 1);
        let message = rx.recv().await.unwrap();
        assert_eq!(message.event, PROGRESS_EVENT);
        let decoded: ProgressPayload = serde_json::from_str(&message.data).unwrap();
        assert_eq!(decoded, payload);
    }
}
