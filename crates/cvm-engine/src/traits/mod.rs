mod change_store;
mod host_client;
mod manifest_mutator;
mod publish_client;
mod state_store;

pub use change_store::ChangeStore;
pub use host_client::{HostClient, HostError};
pub use manifest_mutator::ManifestMutator;
pub use publish_client::{PublishClient, PublishError};
pub use state_store::StateStore;
