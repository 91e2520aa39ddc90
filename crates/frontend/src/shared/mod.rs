pub mod api_utils;
pub mod export;
pub mod modal;
pub mod page_frame;
