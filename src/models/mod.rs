//! Core data models for the object browser.
//!
//! Listing entries and bucket metadata deserialize straight from the console
//! API's JSON; transfer and navigation state serialize for presentation.

pub mod bucket;
pub mod navigation;
pub mod object;
pub mod session;
pub mod transfer;
