mod error;
mod mutator;
mod reader;

pub use error::MutationError;
pub use mutator::{try_update_requirement, update_requirement, verify_version, write_version};
pub use reader::{read_document, read_version};

pub type Result<T> = std::result::Result<T, MutationError>;
