use axum::http::StatusCode;
use contracts::usecases::common::usecase_result::{
    UseCaseError, DUPLICATE, INVALID_STATE, NOT_FOUND, VALIDATION_ERROR,
};
use thiserror::Error;

use crate::domain::a027_catalog_item::repository::CatalogError;

/// Ошибки UseCase создания книжных товаров
#[derive(Debug, Error)]
pub enum BookItemError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<String>,
    },

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BookItemError {
    pub fn validation(message: impl Into<String>) -> Self {
        BookItemError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BookItemError::NotFound(_) => StatusCode::NOT_FOUND,
            BookItemError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            BookItemError::Duplicate(_) => StatusCode::CONFLICT,
            BookItemError::InvalidState(_) => StatusCode::CONFLICT,
            BookItemError::Csv(_) => StatusCode::BAD_REQUEST,
            BookItemError::Catalog(CatalogError::DuplicateBarcode { .. }) => StatusCode::CONFLICT,
            BookItemError::Catalog(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BookItemError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UseCaseError> for BookItemError {
    fn from(err: UseCaseError) -> Self {
        match err.code.as_str() {
            VALIDATION_ERROR => BookItemError::Validation {
                message: err.message,
                details: err
                    .details
                    .map(|d| d.lines().map(str::to_string).collect())
                    .unwrap_or_default(),
            },
            DUPLICATE => BookItemError::Duplicate(err.message),
            INVALID_STATE => BookItemError::InvalidState(err.message),
            NOT_FOUND => BookItemError::NotFound(err.message),
            _ => BookItemError::Internal(anyhow::anyhow!(err.to_string())),
        }
    }
}

impl From<BookItemError> for UseCaseError {
    fn from(err: BookItemError) -> Self {
        match err {
            BookItemError::NotFound(what) => UseCaseError::not_found(format!("{} not found", what)),
            BookItemError::Validation { message, details } => {
                let err = UseCaseError::validation(message);
                if details.is_empty() {
                    err
                } else {
                    err.with_details(details.join("\n"))
                }
            }
            BookItemError::Duplicate(message) => UseCaseError::duplicate(message),
            BookItemError::InvalidState(message) => UseCaseError::invalid_state(message),
            BookItemError::Csv(e) => UseCaseError::validation(format!("CSV error: {}", e)),
            BookItemError::Catalog(e @ CatalogError::DuplicateBarcode { .. }) => {
                UseCaseError::duplicate(e.to_string())
            }
            BookItemError::Catalog(e) => UseCaseError::validation(e.to_string()),
            BookItemError::Internal(e) => UseCaseError::internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_details_survive_roundtrip() {
        let source = UseCaseError::validation("Book Item Creator is not valid")
            .with_details("Class is mandatory in Row 1\nISBN/Barcode is mandatory in Row 2");
        let err = BookItemError::from(source.clone());
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(UseCaseError::from(err), source);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(BookItemError::NotFound("BIC-1".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            BookItemError::from(UseCaseError::invalid_state("x")).status_code(),
            StatusCode::CONFLICT
        );
        let internal = UseCaseError::from(BookItemError::Internal(anyhow::anyhow!("boom")));
        assert!(internal.is(contracts::usecases::common::usecase_result::INTERNAL_ERROR));
    }
}
