//! URL construction for the console API.

pub mod routes;
