pub mod repository;

pub use repository::ClassMasterRepository;
