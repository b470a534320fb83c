//! Services of the object browser: the console API client, the transfer
//! registry and store, the listing controller, the transfer executors, and
//! the session facade tying them together.

pub mod api_client;
pub mod browser;
pub mod executors;
pub mod listing_controller;
pub mod permissions;
pub mod transfer_registry;
pub mod transfer_store;
