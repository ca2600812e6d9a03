pub mod config;
pub mod discover;
pub mod errors;
pub mod extract;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod swap;
pub mod table;
pub mod types;
