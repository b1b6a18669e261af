pub mod diff;
pub mod model;
pub mod theme;
pub mod update;
pub mod view;

// Re-exports for convenience
pub use diff::DiffView;
pub use model::*;
pub use theme::Theme;
pub use update::*;
pub use view::*;
