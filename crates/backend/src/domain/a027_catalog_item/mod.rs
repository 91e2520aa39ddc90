pub mod repository;

pub use repository::{CatalogItem, CatalogRepository, ItemPrice};
