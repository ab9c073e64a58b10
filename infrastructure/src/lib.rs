// Module declarations
pub mod loader;
pub mod persistence;
pub mod search;

// Re-export all implementations
pub use loader::{DirectoryPersonSource, LoadError};
pub use persistence::InMemoryPersonRepository;
