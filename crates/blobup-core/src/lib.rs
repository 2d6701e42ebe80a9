pub mod account;
pub mod config;
pub mod job;
pub mod logging;
pub mod manager;
pub mod pool;
pub mod queue;
pub mod store;
pub mod strategy;
pub mod upload;
