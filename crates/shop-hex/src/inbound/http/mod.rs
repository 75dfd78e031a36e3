pub mod auth;
mod server;

pub use server::{AppState, HttpServer, HttpServerConfig};
