use serde::{Deserialize, Serialize};

use super::response::{CsvRow, QuickAddClass};
use crate::domain::a025_book_item_creator::{BookClassDetail, BookItemCreator};

/// Заголовок CSV шаблона для импорта строк
pub const CSV_TEMPLATE_HEADER: &str = "Class,Selling Rate,Valuation Rate,ISBN/Barcode,Opening Stock";

pub const CSV_TEMPLATE_FILE_NAME: &str = "book_item_creator_template.csv";

/// Шаблон CSV: заголовок и три примерные строки
pub fn csv_template() -> String {
    [
        CSV_TEMPLATE_HEADER,
        "Class 1,150,100,9781234567001,50",
        "Class 2,160,110,9781234567002,45",
        "Class 3,170,120,9781234567003,40",
    ]
    .join("\n")
}

/// Итог слияния импортированных строк с документом
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ImportSummary {
    pub added: usize,
    pub skipped: Vec<String>,
}

impl ImportSummary {
    pub fn indicator(&self) -> &'static str {
        if self.skipped.is_empty() {
            "green"
        } else {
            "orange"
        }
    }

    pub fn message(&self) -> String {
        let mut message = format!("Imported {} row(s)", self.added);
        if !self.skipped.is_empty() {
            message.push_str(&format!(
                "; skipped {}:\n{}",
                self.skipped.len(),
                self.skipped.join("\n")
            ));
        }
        message
    }
}

/// Нестрогий разбор числа из CSV: пробелы и пустые/некорректные значения дают 0
pub fn parse_number(value: &str) -> f64 {
    value
        .trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Добавить строки CSV в документ
///
/// Пустой класс игнорируется. Класс, уже присутствующий в документе или выше в
/// этом же файле, пропускается с сообщением; номер строки считается с заголовком.
pub fn merge_csv_rows(doc: &mut BookItemCreator, rows: &[CsvRow]) -> ImportSummary {
    let mut summary = ImportSummary::default();
    for (idx, row) in rows.iter().enumerate() {
        let class = row.class.trim();
        if class.is_empty() {
            continue;
        }
        if doc.has_class(class) {
            summary
                .skipped
                .push(format!("Row {}: Class \"{}\" already exists", idx + 2, class));
            continue;
        }
        let added = doc.add_row(BookClassDetail::with_rates(
            class,
            parse_number(&row.selling_rate),
            parse_number(&row.valuation_rate),
            &row.isbn_barcode,
            parse_number(&row.opening_stock),
        ));
        if added {
            summary.added += 1;
        }
    }
    if summary.added > 0 {
        doc.calculate_totals();
    }
    summary
}

/// Быстрое добавление: только классы, которых ещё нет. Возвращает число добавленных.
pub fn merge_quick_add(doc: &mut BookItemCreator, classes: &[QuickAddClass]) -> usize {
    let added = classes
        .iter()
        .filter(|c| doc.add_row(BookClassDetail::new(&c.name)))
        .count();
    if added > 0 {
        doc.calculate_totals();
    }
    added
}
