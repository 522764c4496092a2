//! License store implementations.

mod memory;
mod sqlite;

pub use memory::MemoryLicenseStore;
pub use sqlite::SqliteLicenseStore;
