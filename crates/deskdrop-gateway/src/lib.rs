//! # DeskDrop Gateway
//! Thin HTTP front-end over the storage backend, push channel and scheduler.

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, router, serve};
