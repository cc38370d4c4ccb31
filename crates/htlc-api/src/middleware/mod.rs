//! # Middleware
//!
//! Tower layers wrapped around the authenticated API routes.

pub mod tracing_layer;
