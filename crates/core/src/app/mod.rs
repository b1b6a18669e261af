pub mod commands;
pub mod operation;
pub mod queries;

pub use commands::*;
pub use operation::*;
pub use queries::*;
