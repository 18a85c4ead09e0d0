//! Web API for Snapaja.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod token;

pub use server::WebServer;
