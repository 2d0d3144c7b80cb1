mod cache;
mod error;
mod hash;
mod layout;
mod memory;
mod redb_store;
mod store;

pub use cache::CachedStore;
pub use error::StoreError;
pub use hash::compute_desired_hash;
pub use layout::ServiceStateStore;
pub use memory::InMemoryStore;
pub use redb_store::RedbStore;
pub use store::Store;
