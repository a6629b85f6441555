mod config;
mod discover;
mod error;
mod graph;
mod manifest;

pub const DEFAULT_CHANGES_DIR: &str = ".cvm";

pub use config::{CvmConfig, TagFormat};
pub use discover::{Workspace, WorkspaceKind, load_workspace};
pub use error::GraphError;
pub use graph::{DependencyEdge, EdgeKind, PackageGraph, PackageNode};

pub type Result<T> = std::result::Result<T, GraphError>;
