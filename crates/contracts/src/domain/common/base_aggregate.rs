use super::EntityMetadata;
use serde::{Deserialize, Serialize};

/// Базовые поля документа
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseAggregate<Id> {
    /// Уникальный идентификатор записи
    pub id: Id,
    /// Номер документа (например, "BIC-00001"), используется как docname
    pub code: String,
    /// Заголовок документа для списков и уведомлений
    pub description: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub metadata: EntityMetadata,
}

impl<Id> BaseAggregate<Id> {
    pub fn new(id: Id, code: String, description: String) -> Self {
        Self {
            id,
            code,
            description,
            comment: None,
            metadata: EntityMetadata::new(),
        }
    }

    pub fn touch(&mut self) {
        self.metadata.touch();
    }
}
