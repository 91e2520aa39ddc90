pub mod events;
pub mod import;
pub mod progress;
pub mod request;
pub mod response;

pub use events::{ProgressEvent, ProgressNormalizer, ProgressPayload, PROGRESS_EVENT};
pub use import::{ImportSummary, CSV_TEMPLATE_HEADER};
pub use progress::{ProgressOutcome, ProgressSnapshot};

use crate::usecases::common::UseCaseMetadata;

pub struct BookItemCreation;

impl UseCaseMetadata for BookItemCreation {
    fn usecase_index() -> &'static str {
        "u508"
    }

    fn usecase_name() -> &'static str {
        "book_item_creation"
    }

    fn display_name() -> &'static str {
        "Book Item Creator"
    }

    fn description() -> &'static str {
        "Массовое создание книжных товаров по классам с отслеживанием прогресса"
    }
}
