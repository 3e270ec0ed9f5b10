//! Generation backend abstraction layer.
//!
//! Defines a common interface for text-generation backends and the HTTP
//! implementation that talks to the hosted generation endpoint.

mod types;
pub mod http;

// Re-export common types
pub use types::{GenerateRequest, Generator, ProviderError, Result};

// Re-export backend implementations
pub use http::HttpGenerator;
