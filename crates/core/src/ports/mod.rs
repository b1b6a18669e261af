pub mod errors;
pub mod persistence;
pub mod repository;
pub mod time;

// Re-exports
pub use errors::*;
pub use persistence::*;
pub use repository::*;
pub use time::*;
