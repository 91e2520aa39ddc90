use contracts::domain::a025_book_item_creator::{BookItemCreator, BookItemCreatorDto};
use contracts::domain::a026_class_master::ClassGroup;
use contracts::usecases::common::{UseCaseError, UseCaseMetadata};
use contracts::usecases::u508_book_item_creation::request::{
    DocumentRequest, IsbnCheckRequest, ParseCsvRequest, QuickAddRequest,
};
use contracts::usecases::u508_book_item_creation::response::{
    DuplicateResponse, ExportResponse, FileUploadResponse, IsbnCheckResponse, ParseCsvResponse,
    QuickAddClass, RetryResponse, SubmitResponse,
};
use contracts::usecases::u508_book_item_creation::BookItemCreation;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{window, FormData, Request, RequestInit, RequestMode, Response};

use crate::shared::api_utils::api_url;

/// Полный URL маршрута u508
pub fn endpoint(path: &str) -> String {
    api_url(&BookItemCreation::api_path(path))
}

/// Ссылка на файл, выданная сервером (`/api/u508/files/...`)
pub fn file_href(file_url: &str) -> String {
    api_url(file_url)
}

pub async fn list_documents() -> Result<Vec<BookItemCreator>, String> {
    get_json(&endpoint("documents")).await
}

pub async fn get_document(name: &str) -> Result<BookItemCreator, String> {
    let path = format!("documents/{}", urlencoding::encode(name));
    get_json(&endpoint(&path)).await
}

/// Создать или обновить черновик
pub async fn save_document(dto: &BookItemCreatorDto) -> Result<BookItemCreator, String> {
    post_json(&endpoint("documents"), dto).await
}

pub async fn submit(name: &str) -> Result<SubmitResponse, String> {
    post_json(&endpoint("submit"), &DocumentRequest::new(name)).await
}

pub async fn cancel(name: &str) -> Result<BookItemCreator, String> {
    post_json(&endpoint("cancel"), &DocumentRequest::new(name)).await
}

pub async fn retry_failed_items(name: &str) -> Result<RetryResponse, String> {
    post_json(&endpoint("retry_failed_items"), &DocumentRequest::new(name)).await
}

pub async fn export_items_to_excel(name: &str) -> Result<ExportResponse, String> {
    post_json(&endpoint("export_items_to_excel"), &DocumentRequest::new(name)).await
}

pub async fn duplicate(name: &str) -> Result<DuplicateResponse, String> {
    post_json(&endpoint("duplicate"), &DocumentRequest::new(name)).await
}

pub async fn parse_csv(file_url: &str) -> Result<ParseCsvResponse, String> {
    let request = ParseCsvRequest {
        file_url: file_url.to_string(),
    };
    post_json(&endpoint("parse_csv"), &request).await
}

pub async fn get_classes_for_quick_add(group: ClassGroup) -> Result<Vec<QuickAddClass>, String> {
    let query = serde_qs::to_string(&QuickAddRequest { class_type: group })
        .map_err(|e| e.to_string())?;
    get_json(&format!("{}?{}", endpoint("quick_add"), query)).await
}

pub async fn check_isbn_exists(
    isbn: &str,
    exclude_doc: Option<&str>,
) -> Result<IsbnCheckResponse, String> {
    let request = IsbnCheckRequest {
        isbn: isbn.to_string(),
        exclude_doc: exclude_doc.map(str::to_string),
    };
    let query = serde_qs::to_string(&request).map_err(|e| e.to_string())?;
    get_json(&format!("{}?{}", endpoint("check_isbn"), query)).await
}

/// Загрузить CSV на сервер; возвращает ссылку для parse_csv
pub async fn upload_file(file: web_sys::File) -> Result<FileUploadResponse, String> {
    let form_data = FormData::new().map_err(|e| format!("{e:?}"))?;
    form_data
        .append_with_blob_and_filename("file", &file, &file.name())
        .map_err(|e| format!("{e:?}"))?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::Cors);
    opts.set_body(&form_data);

    let request = Request::new_with_str_and_init(&endpoint("files"), &opts)
        .map_err(|e| format!("Failed to create request: {:?}", e))?;

    send(request).await
}

async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, String> {
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(url, &opts)
        .map_err(|e| format!("Failed to create request: {:?}", e))?;

    send(request).await
}

async fn post_json<B: Serialize, T: DeserializeOwned>(url: &str, body: &B) -> Result<T, String> {
    let body = serde_json::to_string(body).map_err(|e| e.to_string())?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::Cors);
    opts.set_body(&JsValue::from_str(&body));

    let request = Request::new_with_str_and_init(url, &opts)
        .map_err(|e| format!("Failed to create request: {:?}", e))?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(|e| format!("Failed to set header: {:?}", e))?;

    send(request).await
}

/// Выполняет запрос; тело ошибки backend разбирается как UseCaseError
async fn send<T: DeserializeOwned>(request: Request) -> Result<T, String> {
    let window = window().ok_or("No window object")?;

    let response_value = wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| format!("Fetch failed: {:?}", e))?;

    let response: Response = response_value.dyn_into().map_err(|_| "Not a Response")?;
    let status = response.status();

    let text = wasm_bindgen_futures::JsFuture::from(
        response.text().map_err(|e| format!("Failed to read body: {:?}", e))?,
    )
    .await
    .map_err(|e| format!("Failed to read body: {:?}", e))?;
    let text = text.as_string().unwrap_or_default();

    if !response.ok() {
        return Err(error_message(status, &text));
    }

    serde_json::from_str(&text).map_err(|e| format!("Failed to parse JSON: {}", e))
}

fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<UseCaseError>(body) {
        Ok(err) => match err.details {
            Some(details) => format!("{}\n{}", err.message, details),
            None => err.message,
        },
        Err(_) => format!("HTTP error: {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_uses_usecase_error_body() {
        let body = serde_json::to_string(
            &UseCaseError::validation("Book Item Creator is not valid")
                .with_details("Row 1: Selling Rate is mandatory"),
        )
        .unwrap();

        assert_eq!(
            error_message(417, &body),
            "Book Item Creator is not valid\nRow 1: Selling Rate is mandatory"
        );
        assert_eq!(error_message(502, "Bad Gateway"), "HTTP error: 502");
    }
}
