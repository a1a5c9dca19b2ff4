pub mod config;
pub mod metrics_server;
pub mod observability;
pub mod routes;
