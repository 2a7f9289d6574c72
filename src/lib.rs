//! Session-scoped controllers behind the outfit planning site.

pub mod assistant;
pub mod config;
pub mod error;
pub mod journey;
pub mod routes;
pub mod session;
pub mod showcase;
