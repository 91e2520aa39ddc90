use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use contracts::dashboards::d402_book_reports::BookItemsRow;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

/// Ошибки каталога товаров
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("{0} is mandatory")]
    MissingField(&'static str),

    #[error("ISBN/Barcode {barcode} already exists in Item {item_code} ({item_name})")]
    DuplicateBarcode {
        barcode: String,
        item_code: String,
        item_name: String,
    },

    #[error("Item {0} not found")]
    NotFound(String),

    #[error("Target warehouse is mandatory for opening stock of {0}")]
    MissingWarehouse(String),
}

/// Цена товара в прайс-листе
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPrice {
    pub price_list: String,
    pub rate: f64,
    pub selling: bool,
}

/// Товар каталога, созданный из строки Book Item Creator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    pub item_code: String,
    pub item_name: String,
    pub description: String,
    pub item_group: String,
    pub stock_uom: String,
    pub default_warehouse: String,
    pub class: String,
    pub publication: String,
    pub subject: String,
    pub author: String,
    pub isbn_barcode: String,
    pub hsn_sac_code: String,
    pub valuation_rate: f64,
    pub prices: Vec<ItemPrice>,
    /// Остаток, оприходованный начальным поступлением
    pub stock_qty: f64,
    pub source_document: String,
    pub created_at: DateTime<Utc>,
}

impl CatalogItem {
    /// Строка отчёта "Book Items Report"; цена продажи из первого прайса продажи
    pub fn report_row(&self) -> BookItemsRow {
        BookItemsRow {
            item_code: self.item_code.clone(),
            item_name: self.item_name.clone(),
            publication: self.publication.clone(),
            subject: self.subject.clone(),
            class: self.class.clone(),
            author: self.author.clone(),
            isbn_barcode: self.isbn_barcode.clone(),
            selling_rate: self.prices.iter().find(|p| p.selling).map(|p| p.rate),
            valuation_rate: self.valuation_rate,
            actual_qty: self.stock_qty,
            stock_value: self.stock_qty * self.valuation_rate,
            source_document: self.source_document.clone(),
            created_on: self.created_at,
        }
    }
}

/// In-memory каталог товаров с уникальным ISBN
pub struct CatalogRepository {
    items: RwLock<BTreeMap<String, CatalogItem>>,
    sequence: AtomicU32,
}

impl CatalogRepository {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            sequence: AtomicU32::new(0),
        }
    }

    fn next_code(&self) -> String {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("BOOK-{:05}", n)
    }

    /// Создать товар; код присваивается каталогом
    pub async fn insert(&self, mut item: CatalogItem) -> Result<String, CatalogError> {
        if item.item_name.trim().is_empty() {
            return Err(CatalogError::MissingField("Item Name"));
        }
        if item.item_group.trim().is_empty() {
            return Err(CatalogError::MissingField("Item Group"));
        }
        if item.stock_uom.trim().is_empty() {
            return Err(CatalogError::MissingField("UOM"));
        }
        if item.isbn_barcode.trim().is_empty() {
            return Err(CatalogError::MissingField("ISBN/Barcode"));
        }

        let mut items = self.items.write().await;
        if let Some(existing) = items.values().find(|i| i.isbn_barcode == item.isbn_barcode) {
            return Err(CatalogError::DuplicateBarcode {
                barcode: item.isbn_barcode.clone(),
                item_code: existing.item_code.clone(),
                item_name: existing.item_name.clone(),
            });
        }
        item.item_code = self.next_code();
        item.created_at = Utc::now();
        let code = item.item_code.clone();
        items.insert(code.clone(), item);
        Ok(code)
    }

    pub async fn add_price(&self, item_code: &str, price: ItemPrice) -> Result<(), CatalogError> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(item_code)
            .ok_or_else(|| CatalogError::NotFound(item_code.to_string()))?;
        item.prices.push(price);
        Ok(())
    }

    /// Начальное поступление остатка на склад товара
    pub async fn receive_stock(
        &self,
        item_code: &str,
        qty: f64,
        warehouse: &str,
    ) -> Result<(), CatalogError> {
        if warehouse.trim().is_empty() {
            return Err(CatalogError::MissingWarehouse(item_code.to_string()));
        }
        let mut items = self.items.write().await;
        let item = items
            .get_mut(item_code)
            .ok_or_else(|| CatalogError::NotFound(item_code.to_string()))?;
        item.stock_qty += qty;
        Ok(())
    }

    pub async fn get(&self, item_code: &str) -> Option<CatalogItem> {
        self.items.read().await.get(item_code).cloned()
    }

    /// Все товары в порядке кодов
    pub async fn list_all(&self) -> Vec<CatalogItem> {
        self.items.read().await.values().cloned().collect()
    }

    pub async fn find_by_isbn(&self, isbn: &str) -> Option<CatalogItem> {
        let isbn = isbn.trim();
        self.items
            .read()
            .await
            .values()
            .find(|i| i.isbn_barcode == isbn)
            .cloned()
    }
}

impl Default for CatalogRepository {
    fn default() -> Self {
        Self::new()
    }
}
