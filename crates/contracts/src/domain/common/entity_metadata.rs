use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Метаданные жизненного цикла документа
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Дата создания записи
    pub created_at: DateTime<Utc>,
    /// Дата последнего изменения
    pub updated_at: DateTime<Utc>,
    /// Момент проведения (submit), если документ проведён
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Версия для optimistic locking
    #[serde(default)]
    pub version: i32,
}

impl EntityMetadata {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            submitted_at: None,
            version: 0,
        }
    }

    /// Обновить timestamp и версию
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.version += 1;
    }

    pub fn mark_submitted(&mut self) {
        let now = Utc::now();
        self.submitted_at = Some(now);
        self.updated_at = now;
    }
}

impl Default for EntityMetadata {
    fn default() -> Self {
        Self::new()
    }
}
