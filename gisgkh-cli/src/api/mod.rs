//! Client for the dom.gosuslugi.ru public REST services.

pub mod client;
pub mod error;
pub mod http;
pub mod regions;

pub use client::{ClientConfig, DEFAULT_BASE_URL, GisGkhClient};
pub use error::{ApiError, ApiResult};
