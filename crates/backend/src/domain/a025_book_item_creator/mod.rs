pub mod repository;

pub use repository::BookItemCreatorRepository;
