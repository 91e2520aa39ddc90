pub mod aggregate;

pub use aggregate::{
    BookClassDetail, BookClassRowDto, BookItemCreator, BookItemCreatorDto, BookItemCreatorId,
    CreationStatus, CreatorStatus, DocStatus,
};
