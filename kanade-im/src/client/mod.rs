//! Conversion engine transports

pub mod http;

pub use http::HttpEngine;
