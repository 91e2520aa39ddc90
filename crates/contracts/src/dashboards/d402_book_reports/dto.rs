//! Отчёты по созданию книжных товаров
//!
//! "Book Creation Summary" - проведённые документы с долей созданных товаров,
//! "Book Items Report" - товары каталога, созданные из документов.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::a025_book_item_creator::{BookItemCreator, CreatorStatus, DocStatus};
use crate::domain::common::{AggregateId, AggregateRoot};

/// Дата попадает в период [from, to], границы включительно
fn within(created_on: DateTime<Utc>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    let day = created_on.date_naive();
    from.map_or(true, |from| day >= from) && to.map_or(true, |to| day <= to)
}

fn same(filter: &Option<String>, value: &str) -> bool {
    filter
        .as_deref()
        .filter(|f| !f.is_empty())
        .map_or(true, |f| f == value)
}

/// Доля созданных товаров в процентах, один знак после запятой.
/// None, если создавать было нечего.
pub fn success_rate(items_created: u32, total_items_to_create: u32) -> Option<f64> {
    if total_items_to_create == 0 {
        return None;
    }
    let rate = items_created as f64 / total_items_to_create as f64 * 100.0;
    Some((rate * 10.0).round() / 10.0)
}

// ============================================================================
// Book Creation Summary
// ============================================================================

/// Фильтр GET /api/u508/reports/book_creation_summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BookCreationSummaryFilter {
    #[serde(default)]
    pub publication: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub status: Option<CreatorStatus>,
    #[serde(default)]
    pub from_date: Option<NaiveDate>,
    #[serde(default)]
    pub to_date: Option<NaiveDate>,
}

impl BookCreationSummaryFilter {
    /// В отчёт попадают только проведённые документы
    pub fn matches(&self, doc: &BookItemCreator) -> bool {
        doc.docstatus == DocStatus::Submitted
            && same(&self.publication, &doc.publication)
            && same(&self.subject, &doc.subject)
            && self.status.map_or(true, |s| s == doc.status)
            && within(doc.metadata().created_at, self.from_date, self.to_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookCreationSummaryRow {
    pub id: String,
    /// Номер документа
    pub name: String,
    pub title: String,
    pub publication: String,
    pub book_name: String,
    pub subject: String,
    pub status: CreatorStatus,
    pub total_items_to_create: u32,
    pub items_created: u32,
    pub success_rate: Option<f64>,
    pub total_opening_stock: f64,
    pub total_stock_value: f64,
    pub created_on: DateTime<Utc>,
    pub submitted_on: Option<DateTime<Utc>>,
}

impl From<&BookItemCreator> for BookCreationSummaryRow {
    fn from(doc: &BookItemCreator) -> Self {
        Self {
            id: doc.id().as_string(),
            name: doc.code().to_string(),
            title: doc.description().to_string(),
            publication: doc.publication.clone(),
            book_name: doc.book_name.clone(),
            subject: doc.subject.clone(),
            status: doc.status,
            total_items_to_create: doc.total_items_to_create,
            items_created: doc.items_created,
            success_rate: success_rate(doc.items_created, doc.total_items_to_create),
            total_opening_stock: doc.total_opening_stock,
            total_stock_value: doc.total_stock_value,
            created_on: doc.metadata().created_at,
            submitted_on: doc.metadata().submitted_at,
        }
    }
}

/// Сегмент диаграммы "документы по статусам"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: CreatorStatus,
    pub label: String,
    pub indicator: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BookCreationSummary {
    /// Новые документы первыми
    pub rows: Vec<BookCreationSummaryRow>,
    pub by_status: Vec<StatusCount>,
    pub total_entries: u32,
    pub items_created: u32,
    pub completed: u32,
    pub total_value: f64,
}

/// Порядок сегментов диаграммы
const SUMMARY_STATUSES: [CreatorStatus; 4] = [
    CreatorStatus::Completed,
    CreatorStatus::PartiallyCreated,
    CreatorStatus::Failed,
    CreatorStatus::InProgress,
];

impl BookCreationSummary {
    pub fn from_rows(mut rows: Vec<BookCreationSummaryRow>) -> Self {
        rows.sort_by(|a, b| b.created_on.cmp(&a.created_on).then_with(|| b.name.cmp(&a.name)));

        let by_status = SUMMARY_STATUSES
            .iter()
            .map(|&status| StatusCount {
                status,
                label: status.label().to_string(),
                indicator: status.indicator().to_string(),
                count: rows.iter().filter(|r| r.status == status).count() as u32,
            })
            .filter(|c| c.count > 0)
            .collect();

        Self {
            total_entries: rows.len() as u32,
            items_created: rows.iter().map(|r| r.items_created).sum(),
            completed: rows
                .iter()
                .filter(|r| r.status == CreatorStatus::Completed)
                .count() as u32,
            total_value: rows.iter().map(|r| r.total_stock_value).sum(),
            by_status,
            rows,
        }
    }

    pub fn count_for(&self, status: CreatorStatus) -> u32 {
        self.by_status
            .iter()
            .find(|c| c.status == status)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

// ============================================================================
// Book Items Report
// ============================================================================

/// Фильтр GET /api/u508/reports/book_items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BookItemsFilter {
    /// Только товары одного документа
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub publication: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub from_date: Option<NaiveDate>,
    #[serde(default)]
    pub to_date: Option<NaiveDate>,
}

impl BookItemsFilter {
    pub fn matches(&self, row: &BookItemsRow) -> bool {
        !row.source_document.is_empty()
            && same(&self.document, &row.source_document)
            && same(&self.publication, &row.publication)
            && same(&self.subject, &row.subject)
            && same(&self.class, &row.class)
            && within(row.created_on, self.from_date, self.to_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookItemsRow {
    pub item_code: String,
    pub item_name: String,
    pub publication: String,
    pub subject: String,
    pub class: String,
    pub author: String,
    pub isbn_barcode: String,
    /// Первая цена продажи товара
    pub selling_rate: Option<f64>,
    pub valuation_rate: f64,
    pub actual_qty: f64,
    pub stock_value: f64,
    pub source_document: String,
    pub created_on: DateTime<Utc>,
}

/// Сегмент диаграммы "товары по издательствам"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationCount {
    pub publication: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BookItemsReport {
    pub rows: Vec<BookItemsRow>,
    pub by_publication: Vec<PublicationCount>,
    pub total_items: u32,
    pub total_stock_qty: f64,
    pub total_stock_value: f64,
}

impl BookItemsReport {
    pub fn from_rows(rows: Vec<BookItemsRow>) -> Self {
        let mut by_publication: Vec<PublicationCount> = Vec::new();
        for row in &rows {
            let publication = if row.publication.is_empty() {
                "Unknown"
            } else {
                row.publication.as_str()
            };
            match by_publication.iter_mut().find(|p| p.publication == publication) {
                Some(entry) => entry.count += 1,
                None => by_publication.push(PublicationCount {
                    publication: publication.to_string(),
                    count: 1,
                }),
            }
        }

        Self {
            total_items: rows.len() as u32,
            total_stock_qty: rows.iter().map(|r| r.actual_qty).sum(),
            total_stock_value: rows.iter().map(|r| r.stock_value).sum(),
            by_publication,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a025_book_item_creator::{BookClassDetail, CreationStatus};

    fn submitted(code: &str, statuses: &[CreationStatus]) -> BookItemCreator {
        let mut doc = BookItemCreator::new_draft(code.into(), "Oxford".into(), "Reader".into());
        for i in 0..statuses.len() {
            doc.add_row(BookClassDetail::with_rates(&format!("Class {}", i + 1), 10.0, 4.0, "", 2.0));
        }
        for (row, status) in doc.class_details.iter_mut().zip(statuses) {
            row.creation_status = *status;
        }
        doc.docstatus = DocStatus::Submitted;
        doc.calculate_totals();
        doc.refresh_status();
        doc
    }

    #[test]
    fn test_success_rate_rounds_to_one_decimal() {
        assert_eq!(success_rate(2, 3), Some(66.7));
        assert_eq!(success_rate(3, 3), Some(100.0));
        assert_eq!(success_rate(0, 0), None);
    }

    #[test]
    fn test_filter_skips_drafts_and_other_publications() {
        let doc = submitted("BIC-00001", &[CreationStatus::Created]);
        let mut draft = doc.clone();
        draft.docstatus = DocStatus::Draft;

        let any = BookCreationSummaryFilter::default();
        assert!(any.matches(&doc));
        assert!(!any.matches(&draft));

        let other = BookCreationSummaryFilter {
            publication: Some("Cambridge".into()),
            ..Default::default()
        };
        assert!(!other.matches(&doc));

        let today = Utc::now().date_naive();
        let period = BookCreationSummaryFilter {
            from_date: Some(today),
            to_date: Some(today),
            status: Some(CreatorStatus::Completed),
            ..Default::default()
        };
        assert!(period.matches(&doc));
    }

    #[test]
    fn test_summary_counts_documents_per_status() {
        let docs = [
            submitted("BIC-00001", &[CreationStatus::Created, CreationStatus::Created]),
            submitted("BIC-00002", &[CreationStatus::Created, CreationStatus::Failed]),
            submitted("BIC-00003", &[CreationStatus::Created]),
        ];
        let summary =
            BookCreationSummary::from_rows(docs.iter().map(BookCreationSummaryRow::from).collect());

        assert_eq!(summary.total_entries, 3);
        assert_eq!(summary.items_created, 4);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.count_for(CreatorStatus::Completed), 2);
        assert_eq!(summary.count_for(CreatorStatus::PartiallyCreated), 1);
        assert_eq!(summary.count_for(CreatorStatus::Failed), 0);
        let partial = summary.rows.iter().find(|r| r.name == "BIC-00002").unwrap();
        assert_eq!(partial.success_rate, Some(50.0));
        assert_eq!(partial.title, "Oxford Reader");
    }
}
