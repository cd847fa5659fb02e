//! wafprobe - WAF detection rate tester
//!
//! Fires a catalogue of attack payloads at a protected target, correlates the
//! firewall's JSON audit log against what was sent, and reports how much was
//! blocked per attack category and per rule.

pub mod catalogue;
pub mod config;
pub mod correlator;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod models;
pub mod report;
pub mod stats;
pub mod tester;
