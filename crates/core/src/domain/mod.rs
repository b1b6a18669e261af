pub mod commit;
pub mod diff;
pub mod events;
pub mod refresh;
pub mod repo;
pub mod selection;

// Re-exports for convenience
pub use commit::*;
pub use diff::*;
pub use events::*;
pub use refresh::*;
pub use repo::*;
pub use selection::*;
