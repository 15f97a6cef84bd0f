pub mod ai;
pub mod backend;
pub mod config;
pub mod core;
pub mod database;
pub mod notify;
