use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{AggregateId, AggregateRoot, BaseAggregate, EntityMetadata};
use crate::usecases::common::UseCaseError;

/// Максимальная длина примечания к строке при ошибке создания
pub const FAILURE_REMARKS_LIMIT: usize = 200;

/// Максимальная длина примечания при ошибке повторного создания
pub const RETRY_REMARKS_LIMIT: usize = 150;

/// Обрезать строку по количеству символов (не байт)
pub fn truncate_chars(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect()
}

// ============================================================================
// ID Type
// ============================================================================

/// Уникальный идентификатор документа создания книжных товаров
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookItemCreatorId(pub Uuid);

impl BookItemCreatorId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for BookItemCreatorId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(BookItemCreatorId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Statuses
// ============================================================================

/// Статус создания товара по строке класса
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CreationStatus {
    #[default]
    Pending,
    Creating,
    Created,
    Failed,
}

impl CreationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreationStatus::Pending => "Pending",
            CreationStatus::Creating => "Creating",
            CreationStatus::Created => "Created",
            CreationStatus::Failed => "Failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Pending" => Some(CreationStatus::Pending),
            "Creating" => Some(CreationStatus::Creating),
            "Created" => Some(CreationStatus::Created),
            "Failed" => Some(CreationStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CreationStatus::Created | CreationStatus::Failed)
    }

    /// Вперёд: Pending -> Creating -> Created|Failed.
    /// Назад только повтор: Failed -> Pending или Failed -> Creating.
    pub fn can_transition_to(&self, next: CreationStatus) -> bool {
        matches!(
            (self, next),
            (CreationStatus::Pending, CreationStatus::Creating)
                | (CreationStatus::Creating, CreationStatus::Created)
                | (CreationStatus::Creating, CreationStatus::Failed)
                | (CreationStatus::Failed, CreationStatus::Pending)
                | (CreationStatus::Failed, CreationStatus::Creating)
        )
    }
}

/// Состояние проведения документа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    #[default]
    Draft,
    Submitted,
    Cancelled,
}

/// Итоговый статус документа, вычисляемый по строкам
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CreatorStatus {
    #[default]
    Draft,
    InProgress,
    PartiallyCreated,
    Completed,
    Failed,
    Cancelled,
}

impl CreatorStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CreatorStatus::Draft => "Draft",
            CreatorStatus::InProgress => "In Progress",
            CreatorStatus::PartiallyCreated => "Partially Created",
            CreatorStatus::Completed => "Completed",
            CreatorStatus::Failed => "Failed",
            CreatorStatus::Cancelled => "Cancelled",
        }
    }

    /// Цвет индикатора статуса в списке и форме
    pub fn indicator(&self) -> &'static str {
        match self {
            CreatorStatus::Completed => "green",
            CreatorStatus::PartiallyCreated => "orange",
            CreatorStatus::Failed => "red",
            CreatorStatus::InProgress => "blue",
            CreatorStatus::Draft | CreatorStatus::Cancelled => "grey",
        }
    }

    /// Статус проведённого документа как чистая функция строк
    pub fn from_rows(rows: &[BookClassDetail]) -> Self {
        if rows.is_empty()
            || rows
                .iter()
                .any(|r| !r.creation_status.is_terminal())
        {
            return CreatorStatus::InProgress;
        }
        let created = rows
            .iter()
            .filter(|r| r.creation_status == CreationStatus::Created)
            .count();
        if created == rows.len() {
            CreatorStatus::Completed
        } else if created == 0 {
            CreatorStatus::Failed
        } else {
            CreatorStatus::PartiallyCreated
        }
    }
}

// ============================================================================
// Child rows
// ============================================================================

/// Строка табличной части: один класс = один создаваемый товар
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BookClassDetail {
    /// Номер строки, начиная с 1
    pub idx: u32,
    pub class: String,
    /// Цена продажи
    pub rate: f64,
    /// Учётная (закупочная) цена
    pub valuation_rate: f64,
    pub isbn_barcode: String,
    pub opening_stock: f64,
    /// opening_stock * valuation_rate
    pub amount: f64,
    #[serde(default)]
    pub creation_status: CreationStatus,
    #[serde(default)]
    pub generated_item_code: Option<String>,
    #[serde(default)]
    pub item_created: bool,
    #[serde(default)]
    pub stock_entry_created: bool,
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl BookClassDetail {
    pub fn new(class: &str) -> Self {
        Self {
            class: class.trim().to_string(),
            ..Default::default()
        }
    }

    pub fn with_rates(
        class: &str,
        rate: f64,
        valuation_rate: f64,
        isbn_barcode: &str,
        opening_stock: f64,
    ) -> Self {
        let mut row = Self::new(class);
        row.rate = rate;
        row.valuation_rate = valuation_rate;
        row.isbn_barcode = isbn_barcode.trim().to_string();
        row.opening_stock = opening_stock;
        row.recalculate_amount();
        row
    }

    pub fn recalculate_amount(&mut self) {
        self.amount = self.opening_stock * self.valuation_rate;
    }

    /// Перевести строку в новый статус, проверив допустимость перехода
    pub fn transition(&mut self, next: CreationStatus) -> Result<(), UseCaseError> {
        if !self.creation_status.can_transition_to(next) {
            return Err(UseCaseError::invalid_state(format!(
                "Row {}: cannot move from {} to {}",
                self.idx,
                self.creation_status.as_str(),
                next.as_str()
            )));
        }
        self.creation_status = next;
        Ok(())
    }

    pub fn mark_created(
        &mut self,
        item_code: String,
        stock_entry_created: bool,
        remarks: Option<String>,
    ) -> Result<(), UseCaseError> {
        self.transition(CreationStatus::Created)?;
        self.generated_item_code = Some(item_code);
        self.item_created = true;
        self.stock_entry_created = stock_entry_created;
        self.creation_timestamp = Some(Utc::now());
        self.remarks = remarks;
        Ok(())
    }

    pub fn mark_failed(&mut self, remarks: String) -> Result<(), UseCaseError> {
        self.transition(CreationStatus::Failed)?;
        self.item_created = false;
        self.remarks = Some(remarks);
        Ok(())
    }

    /// Сбросить всё, что относится к созданию товара (для копии документа)
    fn reset_creation(&mut self) {
        self.creation_status = CreationStatus::Pending;
        self.generated_item_code = None;
        self.item_created = false;
        self.stock_entry_created = false;
        self.creation_timestamp = None;
        self.remarks = None;
    }

    /// Ошибки заполнения строки в формулировках формы
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.class.trim().is_empty() {
            issues.push(format!("Class is mandatory in Row {}", self.idx));
        }
        if self.rate <= 0.0 {
            issues.push(format!("Selling Rate must be greater than 0 in Row {}", self.idx));
        }
        if self.valuation_rate <= 0.0 {
            issues.push(format!(
                "Valuation Rate must be greater than 0 in Row {}",
                self.idx
            ));
        }
        if self.isbn_barcode.trim().is_empty() {
            issues.push(format!("ISBN/Barcode is mandatory in Row {}", self.idx));
        }
        issues
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Документ массового создания книжных товаров по классам
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookItemCreator {
    #[serde(flatten)]
    pub base: BaseAggregate<BookItemCreatorId>,

    pub publication: String,
    #[serde(default)]
    pub subject: String,
    pub book_name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub edition: String,
    #[serde(default)]
    pub publication_year: Option<i32>,

    #[serde(default)]
    pub sales_discount_percent: f64,
    #[serde(default)]
    pub purchase_discount_percent: f64,
    #[serde(default)]
    pub selling_price_list: String,
    #[serde(default)]
    pub buying_price_list: String,

    #[serde(default)]
    pub item_group: String,
    #[serde(default)]
    pub hsn_sac_code: String,
    #[serde(default)]
    pub default_warehouse: String,
    #[serde(default)]
    pub uom: String,

    #[serde(default)]
    pub class_details: Vec<BookClassDetail>,

    #[serde(default)]
    pub docstatus: DocStatus,
    #[serde(default)]
    pub status: CreatorStatus,

    // Итоги по строкам
    #[serde(default)]
    pub total_items_to_create: u32,
    #[serde(default)]
    pub total_opening_stock: f64,
    #[serde(default)]
    pub total_stock_value: f64,
    #[serde(default)]
    pub items_created: u32,
}

impl BookItemCreator {
    /// Создать черновик документа
    pub fn new_draft(code: String, publication: String, book_name: String) -> Self {
        let description = format!("{} {}", publication.trim(), book_name.trim())
            .trim()
            .to_string();
        Self {
            base: BaseAggregate::new(BookItemCreatorId::new_v4(), code, description),
            publication,
            subject: String::new(),
            book_name,
            author: String::new(),
            edition: String::new(),
            publication_year: None,
            sales_discount_percent: 0.0,
            purchase_discount_percent: 0.0,
            selling_price_list: "Standard Selling".to_string(),
            buying_price_list: "Standard Buying".to_string(),
            item_group: "Books".to_string(),
            hsn_sac_code: String::new(),
            default_warehouse: String::new(),
            uom: "Nos".to_string(),
            class_details: Vec::new(),
            docstatus: DocStatus::Draft,
            status: CreatorStatus::Draft,
            total_items_to_create: 0,
            total_opening_stock: 0.0,
            total_stock_value: 0.0,
            items_created: 0,
        }
    }

    /// Номер документа (docname)
    pub fn name(&self) -> &str {
        &self.base.code
    }

    pub fn is_draft(&self) -> bool {
        self.docstatus == DocStatus::Draft
    }

    pub fn is_submitted(&self) -> bool {
        self.docstatus == DocStatus::Submitted
    }

    /// Наименование товара для класса: "{publication} {book_name} {class}"
    pub fn item_name_for(&self, class: &str) -> String {
        format!(
            "{} {} {}",
            self.publication.trim(),
            self.book_name.trim(),
            class.trim()
        )
        .trim()
        .to_string()
    }

    pub fn has_class(&self, class: &str) -> bool {
        let class = class.trim();
        self.class_details.iter().any(|r| r.class == class)
    }

    /// Добавить строку, если такого класса ещё нет. Новая строка всегда Pending.
    pub fn add_row(&mut self, mut row: BookClassDetail) -> bool {
        if row.class.trim().is_empty() || self.has_class(&row.class) {
            return false;
        }
        row.reset_creation();
        row.recalculate_amount();
        self.class_details.push(row);
        self.reindex();
        true
    }

    pub fn remove_row(&mut self, idx: u32) -> bool {
        let before = self.class_details.len();
        self.class_details.retain(|r| r.idx != idx);
        let removed = self.class_details.len() != before;
        if removed {
            self.reindex();
        }
        removed
    }

    fn reindex(&mut self) {
        for (i, row) in self.class_details.iter_mut().enumerate() {
            row.idx = i as u32 + 1;
        }
    }

    /// Пересчитать суммы строк и итоги документа
    pub fn calculate_totals(&mut self) {
        for row in self.class_details.iter_mut() {
            row.recalculate_amount();
        }
        self.total_items_to_create = self.class_details.len() as u32;
        self.total_opening_stock = self.class_details.iter().map(|r| r.opening_stock).sum();
        self.total_stock_value = self.class_details.iter().map(|r| r.amount).sum();
        self.items_created = self
            .class_details
            .iter()
            .filter(|r| r.creation_status == CreationStatus::Created)
            .count() as u32;
    }

    /// Пересчитать статус документа по docstatus и строкам
    pub fn refresh_status(&mut self) {
        self.status = match self.docstatus {
            DocStatus::Draft => CreatorStatus::Draft,
            DocStatus::Cancelled => CreatorStatus::Cancelled,
            DocStatus::Submitted => CreatorStatus::from_rows(&self.class_details),
        };
    }

    /// Повторы класса внутри документа: "Duplicate Class {class} in Row {idx}"
    pub fn duplicate_class_issues(&self) -> Vec<String> {
        let mut seen: Vec<&str> = Vec::new();
        let mut issues = Vec::new();
        for row in &self.class_details {
            let class = row.class.trim();
            if class.is_empty() {
                continue;
            }
            if seen.contains(&class) {
                issues.push(format!("Duplicate Class {} in Row {}", class, row.idx));
            } else {
                seen.push(class);
            }
        }
        issues
    }

    /// Все ошибки заполнения документа, по строкам
    pub fn validate_rows(&self) -> Vec<String> {
        if self.class_details.is_empty() {
            return vec!["Please add at least one class detail".to_string()];
        }
        self.class_details.iter().flat_map(|r| r.issues()).collect()
    }

    /// Проверка перед проведением: заголовок, строки, повторяющиеся классы
    pub fn validate_for_submit(&self) -> Result<(), UseCaseError> {
        let mut issues = Vec::new();
        if self.publication.trim().is_empty() {
            issues.push("Publication is mandatory".to_string());
        }
        if self.book_name.trim().is_empty() {
            issues.push("Book Name is mandatory".to_string());
        }
        issues.extend(self.validate_rows());
        issues.extend(self.duplicate_class_issues());
        if issues.is_empty() {
            Ok(())
        } else {
            Err(UseCaseError::validation("Book Item Creator is not valid")
                .with_details(issues.join("\n")))
        }
    }

    pub fn failed_count(&self) -> usize {
        self.count_with_status(CreationStatus::Failed)
    }

    pub fn count_with_status(&self, status: CreationStatus) -> usize {
        self.class_details
            .iter()
            .filter(|r| r.creation_status == status)
            .count()
    }

    /// Прерванный запуск: строки без итога (Pending, Creating) помечаются Failed.
    /// Возвращает число таких строк.
    pub fn abort_unfinished(&mut self, remarks: &str) -> usize {
        let mut aborted = 0;
        for row in self
            .class_details
            .iter_mut()
            .filter(|r| !r.creation_status.is_terminal())
        {
            row.creation_status = CreationStatus::Failed;
            row.item_created = false;
            row.remarks = Some(truncate_chars(remarks, FAILURE_REMARKS_LIMIT));
            aborted += 1;
        }
        self.calculate_totals();
        self.refresh_status();
        aborted
    }

    /// Коды созданных товаров в порядке строк
    pub fn created_item_codes(&self) -> Vec<String> {
        self.class_details
            .iter()
            .filter(|r| r.creation_status == CreationStatus::Created)
            .filter_map(|r| r.generated_item_code.clone())
            .collect()
    }

    /// Копия документа: заголовок и строки без ISBN, статус Draft, строки Pending
    pub fn duplicate_as_draft(&self, code: String) -> Self {
        let mut copy = self.clone();
        copy.base = BaseAggregate::new(
            BookItemCreatorId::new_v4(),
            code,
            self.base.description.clone(),
        );
        copy.base.comment = self.base.comment.clone();
        copy.docstatus = DocStatus::Draft;
        for row in copy.class_details.iter_mut() {
            row.reset_creation();
            row.isbn_barcode.clear();
        }
        copy.calculate_totals();
        copy.refresh_status();
        copy
    }

    /// Применить данные формы к черновику
    pub fn apply_dto(&mut self, dto: &BookItemCreatorDto) -> Result<(), UseCaseError> {
        if !self.is_draft() {
            return Err(UseCaseError::invalid_state(format!(
                "{} is not a draft and cannot be edited",
                self.name()
            )));
        }
        self.publication = dto.publication.trim().to_string();
        self.subject = dto.subject.clone();
        self.book_name = dto.book_name.trim().to_string();
        self.author = dto.author.clone();
        self.edition = dto.edition.clone();
        self.publication_year = dto.publication_year;
        self.sales_discount_percent = dto.sales_discount_percent;
        self.purchase_discount_percent = dto.purchase_discount_percent;
        self.selling_price_list = dto.selling_price_list.clone();
        self.buying_price_list = dto.buying_price_list.clone();
        self.item_group = dto.item_group.clone();
        self.hsn_sac_code = dto.hsn_sac_code.clone();
        self.default_warehouse = dto.default_warehouse.clone();
        self.uom = dto.uom.clone();
        self.base.comment = dto.comment.clone();
        self.base.description = format!("{} {}", self.publication, self.book_name)
            .trim()
            .to_string();
        self.class_details = dto
            .class_details
            .iter()
            .map(|r| {
                BookClassDetail::with_rates(
                    &r.class,
                    r.rate,
                    r.valuation_rate,
                    &r.isbn_barcode,
                    r.opening_stock,
                )
            })
            .collect();
        self.reindex();
        self.calculate_totals();
        self.refresh_status();
        self.base.touch();
        Ok(())
    }
}

impl AggregateRoot for BookItemCreator {
    type Id = BookItemCreatorId;

    fn id(&self) -> Self::Id {
        self.base.id
    }

    fn code(&self) -> &str {
        &self.base.code
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }

    fn aggregate_index() -> &'static str {
        "a025"
    }

    fn collection_name() -> &'static str {
        "book_item_creator"
    }

    fn element_name() -> &'static str {
        "Book Item Creator"
    }

    fn list_name() -> &'static str {
        "Book Item Creators"
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

/// Строка формы
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BookClassRowDto {
    pub class: String,
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub valuation_rate: f64,
    #[serde(default)]
    pub isbn_barcode: String,
    #[serde(default)]
    pub opening_stock: f64,
}

/// DTO для создания/обновления черновика
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BookItemCreatorDto {
    /// Номер документа; None для нового
    pub name: Option<String>,
    pub publication: String,
    #[serde(default)]
    pub subject: String,
    pub book_name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub edition: String,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub sales_discount_percent: f64,
    #[serde(default)]
    pub purchase_discount_percent: f64,
    #[serde(default)]
    pub selling_price_list: String,
    #[serde(default)]
    pub buying_price_list: String,
    #[serde(default)]
    pub item_group: String,
    #[serde(default)]
    pub hsn_sac_code: String,
    #[serde(default)]
    pub default_warehouse: String,
    #[serde(default)]
    pub uom: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub class_details: Vec<BookClassRowDto>,
}

impl From<&BookItemCreator> for BookItemCreatorDto {
    fn from(doc: &BookItemCreator) -> Self {
        Self {
            name: Some(doc.base.code.clone()),
            publication: doc.publication.clone(),
            subject: doc.subject.clone(),
            book_name: doc.book_name.clone(),
            author: doc.author.clone(),
            edition: doc.edition.clone(),
            publication_year: doc.publication_year,
            sales_discount_percent: doc.sales_discount_percent,
            purchase_discount_percent: doc.purchase_discount_percent,
            selling_price_list: doc.selling_price_list.clone(),
            buying_price_list: doc.buying_price_list.clone(),
            item_group: doc.item_group.clone(),
            hsn_sac_code: doc.hsn_sac_code.clone(),
            default_warehouse: doc.default_warehouse.clone(),
            uom: doc.uom.clone(),
            comment: doc.base.comment.clone(),
            class_details: doc
                .class_details
                .iter()
                .map(|r| BookClassRowDto {
                    class: r.class.clone(),
                    rate: r.rate,
                    valuation_rate: r.valuation_rate,
                    isbn_barcode: r.isbn_barcode.clone(),
                    opening_stock: r.opening_stock,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_rows(statuses: &[CreationStatus]) -> BookItemCreator {
        let mut doc = BookItemCreator::new_draft(
            "BIC-00001".into(),
            "Oxford".into(),
            "English Reader".into(),
        );
        for (i, status) in statuses.iter().enumerate() {
            let class = format!("Class {}", i + 1);
            doc.add_row(BookClassDetail::with_rates(
                &class,
                150.0,
                100.0,
                &format!("97812345670{:02}", i),
                10.0,
            ));
            doc.class_details[i].creation_status = *status;
        }
        doc.docstatus = DocStatus::Submitted;
        doc
    }

    #[test]
    fn test_status_is_function_of_rows() {
        use CreationStatus::*;
        assert_eq!(CreatorStatus::from_rows(&doc_with_rows(&[Created, Created]).class_details), CreatorStatus::Completed);
        assert_eq!(CreatorStatus::from_rows(&doc_with_rows(&[Failed, Failed]).class_details), CreatorStatus::Failed);
        assert_eq!(
            CreatorStatus::from_rows(&doc_with_rows(&[Created, Failed]).class_details),
            CreatorStatus::PartiallyCreated
        );
        assert_eq!(
            CreatorStatus::from_rows(&doc_with_rows(&[Created, Creating]).class_details),
            CreatorStatus::InProgress
        );
        assert_eq!(
            CreatorStatus::from_rows(&doc_with_rows(&[Pending]).class_details),
            CreatorStatus::InProgress
        );
    }

    #[test]
    fn test_refresh_status_respects_docstatus() {
        let mut doc = doc_with_rows(&[CreationStatus::Created]);
        doc.docstatus = DocStatus::Draft;
        doc.refresh_status();
        assert_eq!(doc.status, CreatorStatus::Draft);
        doc.docstatus = DocStatus::Submitted;
        doc.refresh_status();
        assert_eq!(doc.status, CreatorStatus::Completed);
        assert_eq!(doc.status.indicator(), "green");
    }

    #[test]
    fn test_transitions_are_forward_only_except_retry() {
        let mut row = BookClassDetail::new("Class 1");
        assert!(row.transition(CreationStatus::Created).is_err());
        row.transition(CreationStatus::Creating).unwrap();
        row.mark_failed("no warehouse".into()).unwrap();
        assert!(row.transition(CreationStatus::Created).is_err());
        row.transition(CreationStatus::Creating).unwrap();
        row.mark_created("BOOK-0001".into(), true, None).unwrap();
        assert!(row.item_created);
        assert!(row.transition(CreationStatus::Pending).is_err());
    }

    #[test]
    fn test_abort_unfinished_keeps_terminal_rows() {
        let mut doc = doc_with_rows(&[
            CreationStatus::Created,
            CreationStatus::Creating,
            CreationStatus::Pending,
        ]);

        assert_eq!(doc.abort_unfinished("Item creation interrupted"), 2);

        assert_eq!(doc.class_details[0].creation_status, CreationStatus::Created);
        assert_eq!(doc.class_details[1].creation_status, CreationStatus::Failed);
        assert_eq!(
            doc.class_details[2].remarks.as_deref(),
            Some("Item creation interrupted")
        );
        assert_eq!(doc.status, CreatorStatus::PartiallyCreated);
        assert_eq!(doc.items_created, 1);
    }

    #[test]
    fn test_add_row_skips_existing_class_and_reindexes() {
        let mut doc = doc_with_rows(&[]);
        assert!(doc.add_row(BookClassDetail::new("Class 1")));
        assert!(!doc.add_row(BookClassDetail::new(" Class 1 ")));
        assert!(doc.add_row(BookClassDetail::new("Class 2")));
        assert!(doc.remove_row(1));
        assert_eq!(doc.class_details[0].class, "Class 2");
        assert_eq!(doc.class_details[0].idx, 1);
    }

    #[test]
    fn test_totals_are_recomputed_from_rows() {
        let mut doc = doc_with_rows(&[CreationStatus::Created, CreationStatus::Failed]);
        doc.calculate_totals();
        assert_eq!(doc.total_items_to_create, 2);
        assert_eq!(doc.total_opening_stock, 20.0);
        assert_eq!(doc.total_stock_value, 2000.0);
        assert_eq!(doc.items_created, 1);
    }

    #[test]
    fn test_validation_lists_every_offending_row() {
        let mut doc = doc_with_rows(&[]);
        assert_eq!(doc.validate_rows(), vec!["Please add at least one class detail"]);

        doc.add_row(BookClassDetail::with_rates("Class 1", 0.0, 100.0, "111", 1.0));
        doc.add_row(BookClassDetail::with_rates("Class 2", 10.0, 0.0, "", 1.0));
        let issues = doc.validate_rows();
        assert_eq!(
            issues,
            vec![
                "Selling Rate must be greater than 0 in Row 1",
                "Valuation Rate must be greater than 0 in Row 2",
                "ISBN/Barcode is mandatory in Row 2",
            ]
        );
        let err = doc.validate_for_submit().unwrap_err();
        assert!(err.is(crate::usecases::common::usecase_result::VALIDATION_ERROR));
        assert!(err.details.unwrap_or_default().contains("Row 2"));
    }

    #[test]
    fn test_duplicate_class_is_reported_with_row() {
        let mut doc = doc_with_rows(&[CreationStatus::Pending, CreationStatus::Pending]);
        doc.class_details[1].class = "Class 1".into();
        assert_eq!(doc.duplicate_class_issues(), vec!["Duplicate Class Class 1 in Row 2"]);
        assert!(doc.validate_for_submit().is_err());
    }

    #[test]
    fn test_duplicate_as_draft_drops_isbn_and_creation_state() {
        let mut doc = doc_with_rows(&[CreationStatus::Created]);
        doc.class_details[0].generated_item_code = Some("BOOK-0001".into());
        let copy = doc.duplicate_as_draft("BIC-00002".into());
        assert_eq!(copy.name(), "BIC-00002");
        assert_ne!(copy.base.id, doc.base.id);
        assert_eq!(copy.status, CreatorStatus::Draft);
        assert!(copy.class_details[0].isbn_barcode.is_empty());
        assert_eq!(copy.class_details[0].creation_status, CreationStatus::Pending);
        assert!(copy.class_details[0].generated_item_code.is_none());
    }

    #[test]
    fn test_item_name_format() {
        let doc = doc_with_rows(&[]);
        assert_eq!(doc.item_name_for("Class 3"), "Oxford English Reader Class 3");
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate_chars("абвгд", 3), "абв");
    }
}
