pub mod api;
pub mod progress_dialog;
pub mod realtime;
pub mod tracker;
pub mod view;

pub use view::BookItemCreatorPage;
