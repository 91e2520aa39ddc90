pub mod aggregate;

pub use aggregate::{ClassGroup, ClassMaster};
