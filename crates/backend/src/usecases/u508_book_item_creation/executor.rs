use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use contracts::dashboards::d402_book_reports::{
    BookCreationSummary, BookCreationSummaryFilter, BookCreationSummaryRow, BookItemsFilter,
    BookItemsReport,
};
use contracts::domain::a025_book_item_creator::aggregate::{
    truncate_chars, FAILURE_REMARKS_LIMIT, RETRY_REMARKS_LIMIT,
};
use contracts::domain::a025_book_item_creator::{
    BookClassDetail, BookItemCreator, BookItemCreatorDto, CreationStatus, CreatorStatus, DocStatus,
};
use contracts::domain::a026_class_master::ClassGroup;
use contracts::domain::common::AggregateRoot;
use contracts::usecases::u508_book_item_creation::response::{
    DuplicateResponse, ExportResponse, FileUploadResponse, IsbnCheckResponse, IsbnOwnerKind,
    ParseCsvResponse, QuickAddClass, RetryResponse, SubmitResponse,
};
use contracts::usecases::u508_book_item_creation::{ProgressPayload, ProgressSnapshot};

use super::error::BookItemError;
use super::realtime::RealtimeHub;
use super::{csv_import, export};
use crate::domain::a025_book_item_creator::BookItemCreatorRepository;
use crate::domain::a026_class_master::ClassMasterRepository;
use crate::domain::a027_catalog_item::{CatalogItem, CatalogRepository, ItemPrice};
use crate::shared::files::{FileStore, StoredFile};

type Result<T> = std::result::Result<T, BookItemError>;

/// Remarks строк, оставшихся без итога после прерванного запуска
const INTERRUPTED_REMARKS: &str = "Item creation interrupted";

/// Документ занят операцией; снимается при drop
struct DocumentLock {
    name: String,
    busy: Arc<Mutex<HashSet<String>>>,
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        let mut busy = self.busy.lock().unwrap_or_else(|e| e.into_inner());
        busy.remove(&self.name);
    }
}

/// Executor для UseCase создания книжных товаров
#[derive(Clone)]
pub struct BookItemExecutor {
    creators: Arc<BookItemCreatorRepository>,
    classes: Arc<ClassMasterRepository>,
    catalog: Arc<CatalogRepository>,
    files: Arc<FileStore>,
    hub: RealtimeHub,
    item_delay: Duration,
    /// Документы, по которым идёт изменение (сохранение, создание, повтор)
    busy: Arc<Mutex<HashSet<String>>>,
}

impl BookItemExecutor {
    pub fn new(files: Arc<FileStore>, hub: RealtimeHub, item_delay: Duration) -> Self {
        Self {
            creators: Arc::new(BookItemCreatorRepository::new()),
            classes: Arc::new(ClassMasterRepository::new()),
            catalog: Arc::new(CatalogRepository::new()),
            files,
            hub,
            item_delay,
            busy: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn hub(&self) -> &RealtimeHub {
        &self.hub
    }

    // ------------------------------------------------------------------
    // Документ
    // ------------------------------------------------------------------

    /// Создать или обновить черновик по данным формы
    pub async fn upsert(&self, dto: BookItemCreatorDto) -> Result<BookItemCreator> {
        match dto.name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => {
                let _lock = self.lock_document(name)?;
                let mut doc = self.load(name).await?;
                doc.apply_dto(&dto)?;
                self.creators.save(&doc).await?;
                tracing::info!("Updated {}", doc.name());
                Ok(doc)
            }
            None => {
                let mut doc = BookItemCreator::new_draft(
                    self.creators.next_name(),
                    dto.publication.clone(),
                    dto.book_name.clone(),
                );
                doc.apply_dto(&dto)?;
                self.creators.insert(doc.clone()).await?;
                tracing::info!("Created {}", doc.name());
                Ok(doc)
            }
        }
    }

    pub async fn get(&self, name: &str) -> Result<BookItemCreator> {
        self.load(name).await
    }

    pub async fn list_all(&self) -> Vec<BookItemCreator> {
        self.creators.list_all().await
    }

    async fn load(&self, name: &str) -> Result<BookItemCreator> {
        self.creators.get(name).await.ok_or_else(|| {
            BookItemError::NotFound(format!("{} {}", BookItemCreator::element_name(), name))
        })
    }

    /// Один документ не обрабатывается двумя операциями одновременно
    fn lock_document(&self, name: &str) -> Result<DocumentLock> {
        let mut busy = self.busy.lock().unwrap_or_else(|e| e.into_inner());
        if !busy.insert(name.to_string()) {
            return Err(BookItemError::InvalidState(format!(
                "{} is being processed, please try again later",
                name
            )));
        }
        Ok(DocumentLock {
            name: name.to_string(),
            busy: self.busy.clone(),
        })
    }

    /// Отменить проведённый документ; созданные товары остаются в каталоге
    pub async fn cancel(&self, name: &str) -> Result<BookItemCreator> {
        let _lock = self.lock_document(name)?;
        let mut doc = self.load(name).await?;
        if !doc.is_submitted() {
            return Err(BookItemError::InvalidState(format!(
                "{} must be submitted to cancel",
                name
            )));
        }
        if doc.status == CreatorStatus::InProgress {
            return Err(BookItemError::InvalidState(format!(
                "Item creation for {} is still in progress",
                name
            )));
        }
        doc.docstatus = DocStatus::Cancelled;
        doc.refresh_status();
        doc.base.touch();
        self.creators.save(&doc).await?;
        tracing::info!("Cancelled {}", name);
        Ok(doc)
    }

    // ------------------------------------------------------------------
    // Проведение и создание товаров
    // ------------------------------------------------------------------

    /// Провести документ и запустить создание товаров в фоне
    pub async fn submit(&self, name: &str) -> Result<SubmitResponse> {
        let lock = self.lock_document(name)?;
        let mut doc = self.load(name).await?;
        if !doc.is_draft() {
            return Err(BookItemError::InvalidState(format!(
                "{} is already submitted",
                name
            )));
        }
        doc.calculate_totals();
        doc.validate_for_submit()?;
        self.check_duplicate_isbn(&doc).await?;

        doc.docstatus = DocStatus::Submitted;
        doc.base.metadata.mark_submitted();
        doc.refresh_status();
        self.creators.save(&doc).await?;

        let total = doc.class_details.len() as u32;
        tracing::info!("Submitted {}, creating {} items", name, total);

        // блокировка документа держится до конца фонового создания
        let self_clone = self.clone();
        let name_clone = name.to_string();
        tokio::spawn(async move {
            let _lock = lock;
            self_clone.finish_creation(&name_clone).await;
        });

        Ok(SubmitResponse {
            name: name.to_string(),
            total,
        })
    }

    /// ISBN строк не должен принадлежать товару каталога или другому проведённому документу
    async fn check_duplicate_isbn(&self, doc: &BookItemCreator) -> Result<()> {
        let mut issues = Vec::new();
        for row in &doc.class_details {
            if let Some(item) = self.catalog.find_by_isbn(&row.isbn_barcode).await {
                issues.push(format!(
                    "ISBN/Barcode {} already exists in Item {} ({})",
                    row.isbn_barcode, item.item_code, item.item_name
                ));
            } else if let Some((other, class)) = self
                .creators
                .find_isbn_owner(&row.isbn_barcode, Some(doc.name()))
                .await
            {
                issues.push(format!(
                    "ISBN/Barcode {} already used in {} for {}",
                    row.isbn_barcode, other, class
                ));
            }
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(BookItemError::Duplicate(issues.join("\n")))
        }
    }

    /// Фоновое создание; при ошибке строки без итога помечаются Failed
    async fn finish_creation(&self, name: &str) {
        if let Err(e) = self.run_creation(name).await {
            tracing::error!("Item creation failed for {}: {}", name, e);
            self.recover_interrupted(name, &e.to_string()).await;
        }
    }

    /// Вернуть документ из состояния "In Progress" после ошибки запуска
    async fn recover_interrupted(&self, name: &str, error: &str) {
        let Some(mut doc) = self.creators.get(name).await else {
            return;
        };
        if doc.status != CreatorStatus::InProgress {
            return;
        }
        let aborted = doc.abort_unfinished(&format!("{}: {}", INTERRUPTED_REMARKS, error));
        if let Err(e) = self.creators.save(&doc).await {
            tracing::error!("Cannot recover {}: {}", name, e);
            return;
        }
        tracing::warn!(
            "{}: {} unfinished rows marked Failed, status {}",
            name,
            aborted,
            doc.status.label()
        );
        let snapshot = ProgressSnapshot::from_rows(&doc.class_details);
        self.hub
            .publish_progress(&ProgressPayload::counts(name, snapshot));
    }

    /// Создание товаров по строкам с публикацией прогресса после каждой строки
    pub async fn run_creation(&self, name: &str) -> Result<()> {
        let mut doc = self.load(name).await?;
        let total = doc.class_details.len();

        for i in 0..total {
            doc.class_details[i].transition(CreationStatus::Creating)?;
            self.creators.save(&doc).await?;

            if !self.item_delay.is_zero() {
                tokio::time::sleep(self.item_delay).await;
            }

            let row = doc.class_details[i].clone();
            match self.create_item(&doc, &row).await {
                Ok((item_code, stock_entry_created)) => {
                    doc.class_details[i].mark_created(item_code, stock_entry_created, None)?;
                }
                Err(e) => {
                    tracing::warn!("{}: row {} ({}) failed: {}", name, row.idx, row.class, e);
                    doc.class_details[i]
                        .mark_failed(truncate_chars(&e.to_string(), FAILURE_REMARKS_LIMIT))?;
                }
            }
            doc.calculate_totals();
            self.creators.save(&doc).await?;

            let snapshot = ProgressSnapshot::from_rows(&doc.class_details);
            self.hub
                .publish_progress(&ProgressPayload::counts(name, snapshot));
        }

        doc.calculate_totals();
        doc.refresh_status();
        self.creators.save(&doc).await?;
        tracing::info!(
            "Item creation finished for {}: {} ({} of {} created)",
            name,
            doc.status.label(),
            doc.items_created,
            total
        );
        Ok(())
    }

    /// Создать товар, цены и начальный остаток для строки.
    /// Ошибка остатка не отменяет созданный товар.
    async fn create_item(&self, doc: &BookItemCreator, row: &BookClassDetail) -> Result<(String, bool)> {
        let item_name = doc.item_name_for(&row.class);
        let item = CatalogItem {
            item_code: String::new(),
            description: format!("{} - {}", item_name, doc.subject),
            item_name,
            item_group: doc.item_group.clone(),
            stock_uom: doc.uom.clone(),
            default_warehouse: doc.default_warehouse.clone(),
            class: row.class.clone(),
            publication: doc.publication.clone(),
            subject: doc.subject.clone(),
            author: doc.author.clone(),
            isbn_barcode: row.isbn_barcode.clone(),
            hsn_sac_code: doc.hsn_sac_code.clone(),
            valuation_rate: row.valuation_rate,
            prices: Vec::new(),
            stock_qty: 0.0,
            source_document: doc.name().to_string(),
            created_at: Utc::now(),
        };
        let item_code = self.catalog.insert(item).await?;

        if !doc.selling_price_list.is_empty() {
            self.add_price(&item_code, &doc.selling_price_list, row.rate, true)
                .await;
        }
        if !doc.buying_price_list.is_empty() {
            self.add_price(&item_code, &doc.buying_price_list, row.valuation_rate, false)
                .await;
        }

        let mut stock_entry_created = false;
        if row.opening_stock > 0.0 {
            match self
                .catalog
                .receive_stock(&item_code, row.opening_stock, &doc.default_warehouse)
                .await
            {
                Ok(()) => stock_entry_created = true,
                Err(e) => tracing::error!("Stock entry error for {}: {}", item_code, e),
            }
        }

        Ok((item_code, stock_entry_created))
    }

    async fn add_price(&self, item_code: &str, price_list: &str, rate: f64, selling: bool) {
        let price = ItemPrice {
            price_list: price_list.to_string(),
            rate,
            selling,
        };
        if let Err(e) = self.catalog.add_price(item_code, price).await {
            tracing::error!("Price list error for {}: {}", item_code, e);
        }
    }

    /// Повторить создание по строкам со статусом Failed
    pub async fn retry_failed_items(&self, name: &str) -> Result<RetryResponse> {
        let _lock = self.lock_document(name)?;
        let result = self.retry_rows(name).await;
        if let Err(e) = &result {
            self.recover_interrupted(name, &e.to_string()).await;
        }
        result
    }

    async fn retry_rows(&self, name: &str) -> Result<RetryResponse> {
        let mut doc = self.load(name).await?;
        if !doc.is_submitted() {
            return Err(BookItemError::InvalidState(
                "Document must be submitted to retry".into(),
            ));
        }
        if doc.status == CreatorStatus::InProgress {
            return Err(BookItemError::InvalidState(format!(
                "Item creation for {} is still in progress",
                name
            )));
        }
        let failed: Vec<usize> = doc
            .class_details
            .iter()
            .enumerate()
            .filter(|(_, r)| r.creation_status == CreationStatus::Failed)
            .map(|(i, _)| i)
            .collect();
        if failed.is_empty() {
            return Err(BookItemError::InvalidState("No failed items to retry".into()));
        }

        doc.status = CreatorStatus::InProgress;
        self.creators.save(&doc).await?;

        let mut success = 0u32;
        for &i in &failed {
            doc.class_details[i].transition(CreationStatus::Creating)?;
            let row = doc.class_details[i].clone();
            match self.create_item(&doc, &row).await {
                Ok((item_code, stock_entry_created)) => {
                    doc.class_details[i].mark_created(
                        item_code,
                        stock_entry_created,
                        Some("Created on retry".to_string()),
                    )?;
                    success += 1;
                }
                Err(e) => {
                    let remarks = format!(
                        "Retry failed: {}",
                        truncate_chars(&e.to_string(), RETRY_REMARKS_LIMIT)
                    );
                    doc.class_details[i].mark_failed(remarks)?;
                }
            }
        }

        doc.calculate_totals();
        doc.refresh_status();
        self.creators.save(&doc).await?;
        tracing::info!("Retry for {}: {} of {} created", name, success, failed.len());

        Ok(RetryResponse {
            success,
            total_failed: failed.len() as u32,
        })
    }

    // ------------------------------------------------------------------
    // Выгрузка, копия, справочники
    // ------------------------------------------------------------------

    /// Выгрузить созданные товары в CSV и вернуть ссылку на файл
    pub async fn export_items(&self, name: &str) -> Result<ExportResponse> {
        let doc = self.load(name).await?;
        if !doc.is_submitted() {
            return Err(BookItemError::InvalidState(
                "Document must be submitted to export".into(),
            ));
        }

        let mut items = Vec::new();
        for row in &doc.class_details {
            if row.creation_status != CreationStatus::Created {
                continue;
            }
            let Some(code) = row.generated_item_code.as_deref() else {
                continue;
            };
            if let Some(item) = self.catalog.get(code).await {
                items.push((row.clone(), item));
            }
        }
        if items.is_empty() {
            return Err(BookItemError::validation("No items to export"));
        }

        let content = export::build_items_csv(&doc, &items)?;
        let file_name = export::export_file_name(name, Utc::now());
        let file_url = self.files.save(&file_name, "text/csv", content).await;
        tracing::info!("Exported {} items of {} to {}", items.len(), name, file_name);

        Ok(ExportResponse {
            file_url,
            file_name,
        })
    }

    /// Копия документа как новый черновик без ISBN
    pub async fn duplicate(&self, name: &str) -> Result<DuplicateResponse> {
        let source = self.load(name).await?;
        let copy = source.duplicate_as_draft(self.creators.next_name());
        let new_name = copy.name().to_string();
        self.creators.insert(copy).await?;
        tracing::info!("Duplicated {} as {}", name, new_name);
        Ok(DuplicateResponse {
            message: format!("Duplicated {} as {}. Please update ISBN/Barcodes.", name, new_name),
            name: new_name,
        })
    }

    pub async fn get_classes_for_quick_add(&self, group: ClassGroup) -> Vec<QuickAddClass> {
        self.classes
            .list_for_group(group)
            .await
            .iter()
            .map(QuickAddClass::from)
            .collect()
    }

    /// Проверка ISBN: сначала каталог товаров, затем проведённые документы
    pub async fn check_isbn_exists(&self, isbn: &str, exclude_doc: Option<&str>) -> IsbnCheckResponse {
        let isbn = isbn.trim();
        if isbn.is_empty() {
            return IsbnCheckResponse::free();
        }
        if let Some(item) = self.catalog.find_by_isbn(isbn).await {
            return IsbnCheckResponse::taken(IsbnOwnerKind::Item, &item.item_code);
        }
        if let Some((doc, _class)) = self.creators.find_isbn_owner(isbn, exclude_doc).await {
            return IsbnCheckResponse::taken(IsbnOwnerKind::BookItemCreator, &doc);
        }
        IsbnCheckResponse::free()
    }

    // ------------------------------------------------------------------
    // Файлы
    // ------------------------------------------------------------------

    pub async fn upload_file(&self, file_name: &str, content: Vec<u8>) -> FileUploadResponse {
        let file_url = self.files.save(file_name, "text/csv", content).await;
        FileUploadResponse {
            file_url,
            file_name: file_name.to_string(),
        }
    }

    pub async fn download_file(&self, id: uuid::Uuid) -> Result<StoredFile> {
        self.files
            .get(id)
            .await
            .ok_or_else(|| BookItemError::NotFound(format!("File {}", id)))
    }

    /// Разобрать загруженный CSV; ошибки возвращаются в теле ответа
    pub async fn parse_csv_file(&self, file_url: &str) -> ParseCsvResponse {
        // загруженный CSV нужен только для одного разбора
        let Some(file) = self.files.take_by_url(file_url).await else {
            return ParseCsvResponse::failed("File not found");
        };
        let text = String::from_utf8_lossy(&file.content);
        let known = self.classes.list_all().await;
        let is_known = |class: &str| known.iter().any(|c| c.name == class);
        match csv_import::parse_rows(&text, is_known) {
            Ok(parsed) => {
                if parsed.malformed > 0 {
                    tracing::warn!(
                        "CSV {}: {} unreadable records skipped",
                        file.file_name,
                        parsed.malformed
                    );
                }
                if !parsed.unknown_classes.is_empty() {
                    tracing::warn!(
                        "CSV {}: unknown classes dropped: {}",
                        file.file_name,
                        parsed.unknown_classes.join(", ")
                    );
                }
                let malformed = parsed.malformed as u32;
                ParseCsvResponse::ok(parsed.rows).with_dropped(parsed.unknown_classes, malformed)
            }
            Err(e) => {
                tracing::error!("CSV parse error for {}: {}", file.file_name, e);
                ParseCsvResponse::failed(e.to_string())
            }
        }
    }

    // ------------------------------------------------------------------
    // Отчёты
    // ------------------------------------------------------------------

    /// Book Creation Summary: проведённые документы, доля созданных, статусы
    pub async fn book_creation_summary(
        &self,
        filter: &BookCreationSummaryFilter,
    ) -> BookCreationSummary {
        let rows: Vec<BookCreationSummaryRow> = self
            .creators
            .list_all()
            .await
            .iter()
            .filter(|doc| filter.matches(doc))
            .map(BookCreationSummaryRow::from)
            .collect();
        BookCreationSummary::from_rows(rows)
    }

    /// Book Items Report: товары каталога, созданные документами.
    /// Для одного документа порядок строк документа, иначе порядок кодов.
    pub async fn book_items_report(&self, filter: &BookItemsFilter) -> Result<BookItemsReport> {
        let items = match filter.document.as_deref().filter(|d| !d.is_empty()) {
            Some(name) => {
                let doc = self.load(name).await?;
                let mut items = Vec::new();
                for code in doc.created_item_codes() {
                    if let Some(item) = self.catalog.get(&code).await {
                        items.push(item);
                    }
                }
                items
            }
            None => self.catalog.list_all().await,
        };
        let rows = items
            .iter()
            .map(CatalogItem::report_row)
            .filter(|row| filter.matches(row))
            .collect();
        Ok(BookItemsReport::from_rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::a025_book_item_creator::BookClassRowDto;
    use contracts::usecases::u508_book_item_creation::ProgressNormalizer;

    fn executor() -> BookItemExecutor {
        BookItemExecutor::new(
            Arc::new(FileStore::new("/api/u508/files", chrono::Duration::minutes(60))),
            RealtimeHub::new(64),
            Duration::ZERO,
        )
    }

    fn row(class: &str, isbn: &str, stock: f64) -> BookClassRowDto {
        BookClassRowDto {
            class: class.into(),
            rate: 150.0,
            valuation_rate: 100.0,
            isbn_barcode: isbn.into(),
            opening_stock: stock,
        }
    }

    fn dto(rows: Vec<BookClassRowDto>) -> BookItemCreatorDto {
        BookItemCreatorDto {
            publication: "Oxford".into(),
            book_name: "English Reader".into(),
            item_group: "Books".into(),
            uom: "Nos".into(),
            default_warehouse: "Stores".into(),
            selling_price_list: "Standard Selling".into(),
            buying_price_list: "Standard Buying".into(),
            class_details: rows,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_creates_items_and_publishes_progress() {
        let executor = executor();
        let mut rx = executor.hub().subscribe();
        let doc = executor
            .upsert(dto(vec![row("Class 1", "978-1", 10.0), row("Class 2", "978-2", 0.0)]))
            .await
            .unwrap();

        let response = executor.submit(doc.name()).await.unwrap();
        assert_eq!(response.total, 2);

        let mut normalizer = ProgressNormalizer::new();
        let first = normalizer.decode(&rx.recv().await.unwrap().data).unwrap();
        assert_eq!(first.snapshot, ProgressSnapshot::new(1, 0, 2).unwrap());
        let second = normalizer.decode(&rx.recv().await.unwrap().data).unwrap();
        assert!(second.snapshot.is_complete());

        // статус пишется после последнего события
        let mut done = executor.get(doc.name()).await.unwrap();
        for _ in 0..50 {
            if done.status != CreatorStatus::InProgress {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            done = executor.get(doc.name()).await.unwrap();
        }
        assert_eq!(done.status, CreatorStatus::Completed);
        assert_eq!(done.items_created, 2);
        assert!(done.class_details[0].stock_entry_created);
        assert!(!done.class_details[1].stock_entry_created);
        assert_eq!(
            executor.check_isbn_exists("978-1", None).await.kind,
            Some(IsbnOwnerKind::Item)
        );
    }

    #[tokio::test]
    async fn test_run_creation_marks_failed_rows_with_remarks() {
        let executor = executor();
        let mut input = dto(vec![row("Class 1", "978-1", 0.0)]);
        input.item_group.clear();
        let doc = executor.upsert(input).await.unwrap();
        let mut submitted = doc.clone();
        submitted.docstatus = DocStatus::Submitted;
        executor.creators.save(&submitted).await.unwrap();

        executor.run_creation(doc.name()).await.unwrap();
        let done = executor.get(doc.name()).await.unwrap();
        assert_eq!(done.status, CreatorStatus::Failed);
        assert_eq!(done.class_details[0].creation_status, CreationStatus::Failed);
        assert_eq!(done.class_details[0].remarks.as_deref(), Some("Item Group is mandatory"));
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_and_duplicate_isbn() {
        let executor = executor();
        let invalid = executor.upsert(dto(vec![row("Class 1", "", 1.0)])).await.unwrap();
        let err = executor.submit(invalid.name()).await.unwrap_err();
        assert!(matches!(err, BookItemError::Validation { .. }));

        let first = executor.upsert(dto(vec![row("Class 1", "978-9", 0.0)])).await.unwrap();
        executor.submit(first.name()).await.unwrap();
        let second = executor.upsert(dto(vec![row("Class 2", "978-9", 0.0)])).await.unwrap();
        let err = executor.submit(second.name()).await.unwrap_err();
        assert!(matches!(err, BookItemError::Duplicate(_)));
        assert!(matches!(
            executor.submit(first.name()).await.unwrap_err(),
            BookItemError::InvalidState(_)
        ));
    }

    #[tokio::test]
    async fn test_retry_reports_success_out_of_failed() {
        let executor = executor();
        let doc = executor
            .upsert(dto(vec![
                row("Class 1", "978-1", 0.0),
                row("Class 2", "978-2", 0.0),
                row("Class 3", "978-3", 0.0),
            ]))
            .await
            .unwrap();

        // товар с ISBN третьей строки уже есть в каталоге
        let other = executor.upsert(dto(vec![row("Class 9", "978-3", 0.0)])).await.unwrap();
        executor.submit(other.name()).await.unwrap();
        for _ in 0..50 {
            if executor.catalog.find_by_isbn("978-3").await.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let mut failed = doc.clone();
        failed.docstatus = DocStatus::Submitted;
        for r in failed.class_details.iter_mut() {
            r.creation_status = CreationStatus::Failed;
            r.remarks = Some("Warehouse offline".into());
        }
        failed.refresh_status();
        executor.creators.save(&failed).await.unwrap();

        let response = executor.retry_failed_items(doc.name()).await.unwrap();
        assert_eq!(response, RetryResponse { success: 2, total_failed: 3 });
        let snapshot = ProgressSnapshot::from_retry(&response).unwrap();
        assert_eq!((snapshot.success(), snapshot.failed(), snapshot.pending()), (2, 1, 0));

        let after = executor.get(doc.name()).await.unwrap();
        assert_eq!(after.status, CreatorStatus::PartiallyCreated);
        assert_eq!(after.class_details[0].remarks.as_deref(), Some("Created on retry"));
        assert!(after.class_details[2]
            .remarks
            .as_deref()
            .unwrap_or_default()
            .starts_with("Retry failed: ISBN/Barcode 978-3 already exists"));
        assert_eq!(after.class_details[2].creation_status, CreationStatus::Failed);

        executor.retry_failed_items(doc.name()).await.unwrap();
        let err = executor.retry_failed_items(other.name()).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_export_duplicate_and_csv_parse() {
        let executor = executor();
        let doc = executor
            .upsert(dto(vec![row("Class 1", "978-1", 5.0)]))
            .await
            .unwrap();
        assert!(matches!(
            executor.export_items(doc.name()).await.unwrap_err(),
            BookItemError::InvalidState(_)
        ));
        let mut submitted = doc.clone();
        submitted.docstatus = DocStatus::Submitted;
        executor.creators.save(&submitted).await.unwrap();
        executor.run_creation(doc.name()).await.unwrap();

        let exported = executor.export_items(doc.name()).await.unwrap();
        let file = executor.files.get_by_url(&exported.file_url).await.unwrap();
        let text = String::from_utf8(file.content).unwrap();
        assert!(text.starts_with("Item Code,Item Name,Class,Publication"));
        assert!(text.contains("Oxford English Reader Class 1"));

        let copy = executor.duplicate(doc.name()).await.unwrap();
        let copy_doc = executor.get(&copy.name).await.unwrap();
        assert!(copy_doc.is_draft());
        assert!(copy_doc.class_details[0].isbn_barcode.is_empty());

        let upload = executor
            .upload_file("rows.csv", b"Class,Selling Rate\nClass 1,10\nGrade X,5\n".to_vec())
            .await;
        let parsed = executor.parse_csv_file(&upload.file_url).await;
        assert!(parsed.success);
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.unknown_classes, vec!["Grade X".to_string()]);
        // загрузка удаляется после разбора
        assert!(executor.files.get_by_url(&upload.file_url).await.is_none());
        let missing = executor.parse_csv_file("/api/u508/files/unknown").await;
        assert_eq!(missing.error.as_deref(), Some("File not found"));
    }

    #[tokio::test]
    async fn test_quick_add_groups() {
        let executor = executor();
        let senior = executor.get_classes_for_quick_add(ClassGroup::Senior).await;
        let names: Vec<&str> = senior.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Class 11", "Class 12"]);
    }

    #[tokio::test]
    async fn test_interrupted_run_marks_unfinished_rows_failed() {
        let executor = executor();
        let mut rx = executor.hub().subscribe();
        let draft = executor
            .upsert(dto(vec![row("Class 1", "978-1", 0.0), row("Class 2", "978-2", 0.0)]))
            .await
            .unwrap();

        // первая строка уже с итогом: запуск упадёт на переходе Created -> Creating
        let mut doc = draft.clone();
        doc.docstatus = DocStatus::Submitted;
        doc.class_details[0].creation_status = CreationStatus::Created;
        doc.class_details[0].generated_item_code = Some("BOOK-00099".into());
        doc.refresh_status();
        assert_eq!(doc.status, CreatorStatus::InProgress);
        executor.creators.save(&doc).await.unwrap();

        executor.finish_creation(doc.name()).await;

        let after = executor.get(doc.name()).await.unwrap();
        assert_eq!(after.status, CreatorStatus::PartiallyCreated);
        assert_eq!(after.class_details[1].creation_status, CreationStatus::Failed);
        assert!(after.class_details[1]
            .remarks
            .as_deref()
            .unwrap_or_default()
            .starts_with(INTERRUPTED_REMARKS));
        let mut normalizer = ProgressNormalizer::new();
        let last = normalizer.decode(&rx.recv().await.unwrap().data).unwrap();
        assert!(last.snapshot.is_complete());

        let retried = executor.retry_failed_items(doc.name()).await.unwrap();
        assert_eq!(retried, RetryResponse { success: 1, total_failed: 1 });
    }

    #[tokio::test]
    async fn test_busy_document_rejects_second_operation() {
        let executor = BookItemExecutor::new(
            Arc::new(FileStore::new("/api/u508/files", chrono::Duration::minutes(60))),
            RealtimeHub::new(64),
            Duration::from_millis(50),
        );
        let doc = executor.upsert(dto(vec![row("Class 1", "978-1", 0.0)])).await.unwrap();
        let name = doc.name().to_string();

        let held = executor.lock_document(&name).unwrap();
        assert!(matches!(
            executor.submit(&name).await.unwrap_err(),
            BookItemError::InvalidState(_)
        ));
        drop(held);

        // фоновое создание держит документ до конца
        executor.submit(&name).await.unwrap();
        let err = executor.retry_failed_items(&name).await.unwrap_err();
        assert!(matches!(&err, BookItemError::InvalidState(m) if m.contains("being processed")));
        assert!(executor.cancel(&name).await.is_err());

        let mut released = false;
        for _ in 0..100 {
            if executor.lock_document(&name).is_ok() {
                released = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(released);
        assert_eq!(executor.get(&name).await.unwrap().status, CreatorStatus::Completed);
    }

    #[tokio::test]
    async fn test_reports_success_rate_and_status_counts() {
        let executor = executor();
        let complete = executor
            .upsert(dto(vec![row("Class 1", "978-1", 4.0), row("Class 2", "978-2", 0.0)]))
            .await
            .unwrap();
        let mut broken_input = dto(vec![row("Class 3", "978-3", 0.0)]);
        broken_input.item_group.clear();
        let broken = executor.upsert(broken_input).await.unwrap();
        executor.upsert(dto(vec![row("Class 4", "978-4", 0.0)])).await.unwrap();

        for doc in [&complete, &broken] {
            let mut submitted = doc.clone();
            submitted.docstatus = DocStatus::Submitted;
            executor.creators.save(&submitted).await.unwrap();
            executor.run_creation(doc.name()).await.unwrap();
        }

        let summary = executor
            .book_creation_summary(&BookCreationSummaryFilter::default())
            .await;
        assert_eq!(summary.total_entries, 2);
        assert_eq!(summary.items_created, 2);
        assert_eq!(summary.count_for(CreatorStatus::Completed), 1);
        assert_eq!(summary.count_for(CreatorStatus::Failed), 1);
        let rate = |name: &str| {
            summary
                .rows
                .iter()
                .find(|r| r.name == name)
                .and_then(|r| r.success_rate)
        };
        assert_eq!(rate(complete.name()), Some(100.0));
        assert_eq!(rate(broken.name()), Some(0.0));

        let failed_only = executor
            .book_creation_summary(&BookCreationSummaryFilter {
                status: Some(CreatorStatus::Failed),
                ..Default::default()
            })
            .await;
        assert_eq!(failed_only.rows.len(), 1);
        assert_eq!(failed_only.rows[0].name, broken.name());

        let items = executor
            .book_items_report(&BookItemsFilter {
                document: Some(complete.name().to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let classes: Vec<&str> = items.rows.iter().map(|r| r.class.as_str()).collect();
        assert_eq!(classes, vec!["Class 1", "Class 2"]);
        assert_eq!(items.rows[0].selling_rate, Some(150.0));
        assert_eq!(items.total_stock_qty, 4.0);
        assert_eq!(items.total_stock_value, 400.0);

        let by_class = executor
            .book_items_report(&BookItemsFilter {
                class: Some("Class 2".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_class.total_items, 1);
        assert!(executor
            .book_items_report(&BookItemsFilter {
                document: Some("BIC-09999".into()),
                ..Default::default()
            })
            .await
            .is_err());
    }
}
