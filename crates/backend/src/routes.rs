use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers;

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // UseCase u508: Book Item Creation
        // ========================================
        .route(
            "/api/u508/documents",
            get(handlers::usecases::u508_list_documents)
                .post(handlers::usecases::u508_upsert_document),
        )
        .route(
            "/api/u508/documents/:name",
            get(handlers::usecases::u508_get_document),
        )
        .route("/api/u508/submit", post(handlers::usecases::u508_submit))
        .route("/api/u508/cancel", post(handlers::usecases::u508_cancel))
        .route(
            "/api/u508/retry_failed_items",
            post(handlers::usecases::u508_retry_failed_items),
        )
        .route(
            "/api/u508/export_items_to_excel",
            post(handlers::usecases::u508_export_items),
        )
        .route(
            "/api/u508/duplicate",
            post(handlers::usecases::u508_duplicate),
        )
        .route(
            "/api/u508/parse_csv",
            post(handlers::usecases::u508_parse_csv),
        )
        .route(
            "/api/u508/quick_add",
            get(handlers::usecases::u508_quick_add),
        )
        .route(
            "/api/u508/check_isbn",
            get(handlers::usecases::u508_check_isbn),
        )
        .route(
            "/api/u508/files",
            post(handlers::usecases::u508_upload_file),
        )
        .route(
            "/api/u508/files/:id",
            get(handlers::usecases::u508_download_file),
        )
        .route(
            "/api/u508/reports/book_creation_summary",
            get(handlers::usecases::u508_book_creation_summary),
        )
        .route(
            "/api/u508/reports/book_items",
            get(handlers::usecases::u508_book_items_report),
        )
        .route(
            "/api/u508/realtime",
            get(handlers::usecases::u508_realtime),
        )
}
