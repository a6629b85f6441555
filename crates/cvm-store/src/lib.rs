mod error;
mod parse;
mod store;

pub const CHANGES_SUBDIR: &str = "changes";

pub use error::{DescriptorError, StoreError};
pub use parse::{parse_descriptor, serialize_descriptor};
pub use store::ChangeDir;

pub type Result<T> = std::result::Result<T, StoreError>;
