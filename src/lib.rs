pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod mail;
pub mod monitor;
pub mod report;
pub mod store;
