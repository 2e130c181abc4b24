pub mod config;
pub mod journal;
