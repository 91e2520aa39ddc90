use axum::{
    extract::{Multipart, Path, Query},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use contracts::dashboards::d402_book_reports::{
    BookCreationSummary, BookCreationSummaryFilter, BookItemsFilter, BookItemsReport,
};
use contracts::domain::a025_book_item_creator::{BookItemCreator, BookItemCreatorDto};
use contracts::usecases::common::UseCaseError;
use contracts::usecases::u508_book_item_creation::request::{
    DocumentRequest, IsbnCheckRequest, ParseCsvRequest, QuickAddRequest,
};
use contracts::usecases::u508_book_item_creation::response::{
    DuplicateResponse, ExportResponse, FileUploadResponse, IsbnCheckResponse, ParseCsvResponse,
    QuickAddClass, RetryResponse, SubmitResponse,
};
use futures_util::stream::Stream;
use once_cell::sync::Lazy;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use crate::shared::config::get_config;
use crate::shared::files::FileStore;
use crate::usecases::u508_book_item_creation::{BookItemError, BookItemExecutor, RealtimeHub};

// ============================================================================
// UseCase u508: Book Item Creation
// ============================================================================

static BOOK_ITEM_EXECUTOR: Lazy<Arc<BookItemExecutor>> = Lazy::new(|| {
    let config = get_config();
    let files = Arc::new(FileStore::new(
        &config.files.public_prefix,
        chrono::Duration::minutes(config.files.retention_minutes),
    ));
    Arc::new(BookItemExecutor::new(
        files,
        RealtimeHub::default(),
        Duration::from_millis(config.creation.item_delay_ms),
    ))
});

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<UseCaseError>)>;

fn api_error(context: &str, err: BookItemError) -> (StatusCode, Json<UseCaseError>) {
    let status = err.status_code();
    if status.is_server_error() {
        tracing::error!("{}: {}", context, err);
    } else {
        tracing::warn!("{}: {}", context, err);
    }
    (status, Json(UseCaseError::from(err)))
}

/// GET /api/u508/documents
pub async fn u508_list_documents() -> Json<Vec<BookItemCreator>> {
    Json(BOOK_ITEM_EXECUTOR.list_all().await)
}

/// POST /api/u508/documents
pub async fn u508_upsert_document(Json(dto): Json<BookItemCreatorDto>) -> ApiResult<BookItemCreator> {
    BOOK_ITEM_EXECUTOR
        .upsert(dto)
        .await
        .map(Json)
        .map_err(|e| api_error("Failed to save Book Item Creator", e))
}

/// GET /api/u508/documents/:name
pub async fn u508_get_document(Path(name): Path<String>) -> ApiResult<BookItemCreator> {
    BOOK_ITEM_EXECUTOR
        .get(&name)
        .await
        .map(Json)
        .map_err(|e| api_error("Failed to load Book Item Creator", e))
}

/// POST /api/u508/submit
pub async fn u508_submit(Json(request): Json<DocumentRequest>) -> ApiResult<SubmitResponse> {
    BOOK_ITEM_EXECUTOR
        .submit(&request.name)
        .await
        .map(Json)
        .map_err(|e| api_error("Failed to submit", e))
}

/// POST /api/u508/cancel
pub async fn u508_cancel(Json(request): Json<DocumentRequest>) -> ApiResult<BookItemCreator> {
    BOOK_ITEM_EXECUTOR
        .cancel(&request.name)
        .await
        .map(Json)
        .map_err(|e| api_error("Failed to cancel", e))
}

/// POST /api/u508/retry_failed_items
pub async fn u508_retry_failed_items(Json(request): Json<DocumentRequest>) -> ApiResult<RetryResponse> {
    BOOK_ITEM_EXECUTOR
        .retry_failed_items(&request.name)
        .await
        .map(Json)
        .map_err(|e| api_error("Failed to retry items", e))
}

/// POST /api/u508/export_items_to_excel
pub async fn u508_export_items(Json(request): Json<DocumentRequest>) -> ApiResult<ExportResponse> {
    BOOK_ITEM_EXECUTOR
        .export_items(&request.name)
        .await
        .map(Json)
        .map_err(|e| api_error("Failed to export items", e))
}

/// POST /api/u508/duplicate
pub async fn u508_duplicate(Json(request): Json<DocumentRequest>) -> ApiResult<DuplicateResponse> {
    BOOK_ITEM_EXECUTOR
        .duplicate(&request.name)
        .await
        .map(Json)
        .map_err(|e| api_error("Failed to duplicate", e))
}

/// POST /api/u508/parse_csv
pub async fn u508_parse_csv(Json(request): Json<ParseCsvRequest>) -> Json<ParseCsvResponse> {
    Json(BOOK_ITEM_EXECUTOR.parse_csv_file(&request.file_url).await)
}

/// GET /api/u508/quick_add?class_type=primary
pub async fn u508_quick_add(Query(request): Query<QuickAddRequest>) -> Json<Vec<QuickAddClass>> {
    Json(
        BOOK_ITEM_EXECUTOR
            .get_classes_for_quick_add(request.class_type)
            .await,
    )
}

/// GET /api/u508/check_isbn?isbn=...&exclude_doc=...
pub async fn u508_check_isbn(Query(request): Query<IsbnCheckRequest>) -> Json<IsbnCheckResponse> {
    Json(
        BOOK_ITEM_EXECUTOR
            .check_isbn_exists(&request.isbn, request.exclude_doc.as_deref())
            .await,
    )
}

/// POST /api/u508/files (multipart, поле "file")
pub async fn u508_upload_file(mut multipart: Multipart) -> ApiResult<FileUploadResponse> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(api_error(
                    "Failed to read upload",
                    BookItemError::validation(format!("Invalid multipart body: {}", e)),
                ))
            }
        };
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.csv").to_string();
        let bytes = field.bytes().await.map_err(|e| {
            api_error(
                "Failed to read upload",
                BookItemError::validation(format!("Invalid file: {}", e)),
            )
        })?;
        let response = BOOK_ITEM_EXECUTOR.upload_file(&file_name, bytes.to_vec()).await;
        tracing::info!("Uploaded {} ({} bytes)", file_name, bytes.len());
        return Ok(Json(response));
    }
    Err(api_error(
        "Failed to read upload",
        BookItemError::validation("Field \"file\" is missing"),
    ))
}

/// GET /api/u508/files/:id
pub async fn u508_download_file(Path(id): Path<uuid::Uuid>) -> Response {
    match BOOK_ITEM_EXECUTOR.download_file(id).await {
        Ok(file) => (
            [
                (header::CONTENT_TYPE, file.content_type),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file.file_name),
                ),
            ],
            file.content,
        )
            .into_response(),
        Err(e) => api_error("Failed to download file", e).into_response(),
    }
}

/// GET /api/u508/reports/book_creation_summary?publication=...&status=completed&from_date=2026-01-01
pub async fn u508_book_creation_summary(
    Query(filter): Query<BookCreationSummaryFilter>,
) -> Json<BookCreationSummary> {
    Json(BOOK_ITEM_EXECUTOR.book_creation_summary(&filter).await)
}

/// GET /api/u508/reports/book_items?document=BIC-00001&class=...
pub async fn u508_book_items_report(
    Query(filter): Query<BookItemsFilter>,
) -> ApiResult<BookItemsReport> {
    BOOK_ITEM_EXECUTOR
        .book_items_report(&filter)
        .await
        .map(Json)
        .map_err(|e| api_error("Failed to build Book Items Report", e))
}

/// GET /api/u508/realtime (SSE)
pub async fn u508_realtime() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = BOOK_ITEM_EXECUTOR.hub().subscribe();
    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(msg) => yield Ok(Event::default().event(msg.event).data(msg.data)),
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("SSE client lagged by {} messages", n);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}
