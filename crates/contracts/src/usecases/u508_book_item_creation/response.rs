use serde::{Deserialize, Serialize};

use crate::domain::a026_class_master::ClassMaster;

/// Результат проведения: создание товаров запущено в фоне
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub name: String,
    /// Количество строк, по которым будут создаваться товары
    pub total: u32,
}

/// `{success, total_failed}`: сколько из повторённых строк создано
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryResponse {
    pub success: u32,
    pub total_failed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub file_url: String,
    pub file_name: String,
}

/// Строка CSV после нормализации заголовков; значения как в файле (обрезаны)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CsvRow {
    pub class: String,
    #[serde(default)]
    pub selling_rate: String,
    #[serde(default)]
    pub valuation_rate: String,
    #[serde(default)]
    pub isbn_barcode: String,
    #[serde(default)]
    pub opening_stock: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ParseCsvResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<CsvRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Классы, которых нет в справочнике; их строки не попали в `data`
    #[serde(default)]
    pub unknown_classes: Vec<String>,
    /// Записи файла, которые не удалось прочитать
    #[serde(default)]
    pub malformed: u32,
}

impl ParseCsvResponse {
    pub fn ok(data: Vec<CsvRow>) -> Self {
        Self {
            success: true,
            data,
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_dropped(mut self, unknown_classes: Vec<String>, malformed: u32) -> Self {
        self.unknown_classes = unknown_classes;
        self.malformed = malformed;
        self
    }

    /// Что из файла не попало в строки; None, если отброшенного нет
    pub fn dropped_message(&self) -> Option<String> {
        let mut parts = Vec::new();
        if !self.unknown_classes.is_empty() {
            parts.push(format!(
                "Unknown classes skipped: {}",
                self.unknown_classes.join(", ")
            ));
        }
        if self.malformed > 0 {
            parts.push(format!("{} unreadable records skipped", self.malformed));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(". "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateResponse {
    pub name: String,
    pub message: String,
}

/// Класс в ответе быстрого добавления
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickAddClass {
    pub name: String,
    pub class_name: String,
    pub short_code: String,
    pub sort_order: u32,
}

impl From<&ClassMaster> for QuickAddClass {
    fn from(class: &ClassMaster) -> Self {
        Self {
            name: class.name.clone(),
            class_name: class.class_name.clone(),
            short_code: class.short_code.clone(),
            sort_order: class.sort_order,
        }
    }
}

/// Где уже используется ISBN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IsbnOwnerKind {
    Item,
    #[serde(rename = "Book Item Creator")]
    BookItemCreator,
}

impl IsbnOwnerKind {
    pub fn label(&self) -> &'static str {
        match self {
            IsbnOwnerKind::Item => "Item",
            IsbnOwnerKind::BookItemCreator => "Book Item Creator",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IsbnCheckResponse {
    pub exists: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<IsbnOwnerKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl IsbnCheckResponse {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn taken(kind: IsbnOwnerKind, name: &str) -> Self {
        Self {
            exists: true,
            kind: Some(kind),
            name: Some(name.to_string()),
        }
    }

    /// Текст предупреждения для формы; None, если ISBN свободен
    pub fn warning(&self, isbn: &str) -> Option<String> {
        if !self.exists {
            return None;
        }
        let kind = self.kind.map(|k| k.label()).unwrap_or("document");
        let name = self.name.as_deref().unwrap_or("");
        Some(format!("ISBN {} already exists in {} {}", isbn, kind, name).trim_end().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUploadResponse {
    pub file_url: String,
    pub file_name: String,
}
