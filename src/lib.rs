pub mod cli;
pub mod config;
pub mod errors;
pub mod git;
pub mod pulls;
pub mod sync;
pub mod utils;

pub use errors::{BuddyError, Result};
