//! Request/response TCP service exposing the conversion pipeline.

pub mod protocol;
pub mod server;

pub use protocol::{ServiceRequest, ServiceResponse};
pub use server::{DEFAULT_PORT, ServerHandle, ServiceConfig, serve};
