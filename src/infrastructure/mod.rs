//! Infrastructure layer - embedding backends, file loading, logging

pub mod embedding;
pub mod http_client;
pub mod logging;
pub mod schema_loader;
