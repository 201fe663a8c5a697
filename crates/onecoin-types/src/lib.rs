//! Wire types shared by the storage layer, the REST handlers and the server.

pub mod api;
pub mod models;
