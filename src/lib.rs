//! Client-side core of an object-storage console: bucket listing and folder
//! navigation, plus a transfer manager for concurrent uploads and downloads.

pub mod config;
pub mod errors;
pub mod models;
pub mod paths;
pub mod routes;
pub mod services;
