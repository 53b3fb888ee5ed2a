//! Domain layer for the static location directory plugin.

pub mod client;
pub mod service;

pub use service::Service;
