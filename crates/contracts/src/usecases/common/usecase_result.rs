use serde::{Deserialize, Serialize};

/// Результат выполнения UseCase
pub type UseCaseResult<T> = Result<T, UseCaseError>;

pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const DUPLICATE: &str = "DUPLICATE";
pub const REMOTE_CALL_FAILED: &str = "REMOTE_CALL_FAILED";
pub const INVALID_STATE: &str = "INVALID_STATE";
pub const NOT_FOUND: &str = "NOT_FOUND";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Ошибка выполнения UseCase
///
/// Сериализуется в тело HTTP ответа, поэтому одна и та же структура
/// используется на backend и во frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseCaseError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
}

impl UseCaseError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Незаполненные обязательные поля строк и т.п.; блокирует проведение
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(VALIDATION_ERROR, message)
    }

    /// Класс уже есть в документе или ISBN занят другим товаром
    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::new(DUPLICATE, message)
    }

    /// Сетевая ошибка или ошибка сервера при удалённом вызове
    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(REMOTE_CALL_FAILED, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(INVALID_STATE, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

impl std::fmt::Display for UseCaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, ": {}", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for UseCaseError {}

impl From<anyhow::Error> for UseCaseError {
    fn from(err: anyhow::Error) -> Self {
        UseCaseError::internal(err.to_string())
    }
}
