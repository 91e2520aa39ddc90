pub mod a025_book_item_creator;
pub mod a026_class_master;
pub mod a027_catalog_item;
