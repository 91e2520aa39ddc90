use serde::{Deserialize, Serialize};

use crate::domain::a026_class_master::ClassGroup;

/// Запрос, адресующий один документ по номеру (submit, retry, export, duplicate, cancel)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub name: String,
}

impl DocumentRequest {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// Разбор ранее загруженного CSV файла
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseCsvRequest {
    pub file_url: String,
}

/// Классы для быстрого добавления строк
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QuickAddRequest {
    #[serde(default)]
    pub class_type: ClassGroup,
}

/// Проверка занятости ISBN/штрихкода
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsbnCheckRequest {
    pub isbn: String,
    /// Документ, строки которого не считаются конфликтом (текущий)
    #[serde(default)]
    pub exclude_doc: Option<String>,
}
