//! Client for the external routing and place-autocomplete provider.

pub mod client;
pub mod types;

pub use client::Client;
pub use types::{Place, Route, SearchArea};
