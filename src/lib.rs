pub mod app;
pub mod composio;
pub mod config;
pub mod connection;
pub mod intent;
pub mod provider;
pub mod repository;
pub mod session;
pub mod shared;
