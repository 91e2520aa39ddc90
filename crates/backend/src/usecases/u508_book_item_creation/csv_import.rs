use contracts::usecases::u508_book_item_creation::response::CsvRow;

/// Колонка импорта, определённая по заголовку
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Class,
    SellingRate,
    ValuationRate,
    IsbnBarcode,
    OpeningStock,
}

/// Нормализация заголовка: регистр и пробелы не важны, достаточно ключевого слова
fn classify_header(header: &str) -> Option<Column> {
    let key = header.trim().to_lowercase();
    if key.contains("class") {
        Some(Column::Class)
    } else if key.contains("selling") || key == "rate" {
        Some(Column::SellingRate)
    } else if key.contains("valuation") {
        Some(Column::ValuationRate)
    } else if key.contains("isbn") || key.contains("barcode") {
        Some(Column::IsbnBarcode)
    } else if key.contains("stock") || key.contains("opening") {
        Some(Column::OpeningStock)
    } else {
        None
    }
}

/// Результат разбора CSV файла строк
#[derive(Debug, Default)]
pub struct ParsedCsv {
    pub rows: Vec<CsvRow>,
    /// Классы, которых нет в справочнике (строки отброшены)
    pub unknown_classes: Vec<String>,
    /// Записи, которые не удалось прочитать
    pub malformed: usize,
}

/// Разобрать CSV с заголовком; строки без класса и с неизвестным классом отбрасываются
pub fn parse_rows(csv_text: &str, is_known_class: impl Fn(&str) -> bool) -> Result<ParsedCsv, csv::Error> {
    // Strip UTF-8 BOM if present
    let text = csv_text.trim_start_matches('\u{FEFF}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<Option<Column>> = reader.headers()?.iter().map(classify_header).collect();
    tracing::info!("CSV import columns: {:?}", columns);

    let mut parsed = ParsedCsv::default();

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Skipping malformed CSV record: {}", e);
                parsed.malformed += 1;
                continue;
            }
        };

        let mut row = CsvRow::default();
        for (column, value) in columns.iter().zip(record.iter()) {
            let value = value.trim().to_string();
            match column {
                Some(Column::Class) => row.class = value,
                Some(Column::SellingRate) => row.selling_rate = value,
                Some(Column::ValuationRate) => row.valuation_rate = value,
                Some(Column::IsbnBarcode) => row.isbn_barcode = value,
                Some(Column::OpeningStock) => row.opening_stock = value,
                None => {}
            }
        }

        if row.class.is_empty() {
            continue;
        }
        if !is_known_class(&row.class) {
            tracing::warn!("Class not found: {}", row.class);
            parsed.unknown_classes.push(row.class);
            continue;
        }
        parsed.rows.push(row);
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::usecases::u508_book_item_creation::import::csv_template;

    fn known(class: &str) -> bool {
        class.starts_with("Class ")
    }

    #[test]
    fn test_template_parses_back() {
        let parsed = parse_rows(&csv_template(), known).unwrap();
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[0].class, "Class 1");
        assert_eq!(parsed.rows[0].selling_rate, "150");
        assert_eq!(parsed.rows[0].valuation_rate, "100");
        assert_eq!(parsed.rows[0].isbn_barcode, "9781234567001");
        assert_eq!(parsed.rows[0].opening_stock, "50");
    }

    #[test]
    fn test_bom_loose_headers_and_unknown_classes() {
        let text = "\u{FEFF} class ,Rate,VALUATION,Barcode,Opening\nClass 1, 10 ,5, 978 ,2\nGrade X,1,1,1,1\n,1,1,1,1\n";
        let parsed = parse_rows(text, known).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].selling_rate, "10");
        assert_eq!(parsed.rows[0].isbn_barcode, "978");
        assert_eq!(parsed.unknown_classes, vec!["Grade X"]);
    }

    #[test]
    fn test_missing_columns_stay_empty() {
        let parsed = parse_rows("Class\nClass 4\n", known).unwrap();
        assert_eq!(parsed.rows[0].class, "Class 4");
        assert!(parsed.rows[0].selling_rate.is_empty());
    }
}
