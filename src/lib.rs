pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod schema;
pub mod store;
pub mod views;
