//! HTTP client module for wafprobe

pub mod client;
pub use client::{Delivery, HttpClient};
