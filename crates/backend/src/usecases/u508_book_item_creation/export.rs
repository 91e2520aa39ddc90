use contracts::domain::a025_book_item_creator::{BookClassDetail, BookItemCreator};
use serde::Serialize;

use crate::domain::a027_catalog_item::CatalogItem;

/// Строка выгрузки созданных товаров
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Item Code")]
    item_code: &'a str,
    #[serde(rename = "Item Name")]
    item_name: &'a str,
    #[serde(rename = "Class")]
    class: &'a str,
    #[serde(rename = "Publication")]
    publication: &'a str,
    #[serde(rename = "Subject")]
    subject: &'a str,
    #[serde(rename = "Author")]
    author: &'a str,
    #[serde(rename = "ISBN/Barcode")]
    isbn_barcode: &'a str,
    #[serde(rename = "Selling Rate")]
    selling_rate: f64,
    #[serde(rename = "Valuation Rate")]
    valuation_rate: f64,
    #[serde(rename = "Opening Stock")]
    opening_stock: f64,
    #[serde(rename = "Stock Value")]
    stock_value: f64,
    #[serde(rename = "Item Group")]
    item_group: &'a str,
    #[serde(rename = "UOM")]
    uom: &'a str,
    #[serde(rename = "Warehouse")]
    warehouse: &'a str,
    #[serde(rename = "Creation Date")]
    creation_date: String,
}

/// CSV со всеми созданными товарами документа, в порядке строк
pub fn build_items_csv(
    doc: &BookItemCreator,
    items: &[(BookClassDetail, CatalogItem)],
) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for (row, item) in items {
        writer.serialize(ExportRow {
            item_code: &item.item_code,
            item_name: &item.item_name,
            class: &row.class,
            publication: &doc.publication,
            subject: &doc.subject,
            author: &doc.author,
            isbn_barcode: &row.isbn_barcode,
            selling_rate: row.rate,
            valuation_rate: row.valuation_rate,
            opening_stock: row.opening_stock,
            stock_value: row.opening_stock * row.valuation_rate,
            item_group: &item.item_group,
            uom: &item.stock_uom,
            warehouse: &doc.default_warehouse,
            creation_date: row
                .creation_timestamp
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        })?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Имя файла выгрузки: Book_Items_{docname}_{YYYYmmdd_HHMMSS}.csv
pub fn export_file_name(docname: &str, now: chrono::DateTime<chrono::Utc>) -> String {
    format!("Book_Items_{}_{}.csv", docname, now.format("%Y%m%d_%H%M%S"))
}
