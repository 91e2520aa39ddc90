pub mod common;
pub mod u508_book_item_creation;
