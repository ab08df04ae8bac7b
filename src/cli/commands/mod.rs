pub mod completions;
pub mod config;
pub mod fetch;
pub mod rebase;
pub mod remote;
pub mod status;
pub mod version;
