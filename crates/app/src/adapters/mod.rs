pub mod git;
pub mod persistence;
