//! Report rendering: console summary, JSON and plain text files

pub mod console;
pub mod json;
pub mod text;

use std::fmt;

/// Overall verdict derived from the detection rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    Critical,
}

impl Rating {
    pub fn from_rate(detection_rate: f64) -> Self {
        if detection_rate >= 90.0 {
            Rating::Excellent
        } else if detection_rate >= 70.0 {
            Rating::Good
        } else if detection_rate >= 50.0 {
            Rating::Fair
        } else {
            Rating::Critical
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Excellent => write!(f, "EXCELLENT"),
            Rating::Good => write!(f, "GOOD"),
            Rating::Fair => write!(f, "FAIR"),
            Rating::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// `sql_injection` -> `SQL INJECTION`
pub fn category_label(attack_type: &str) -> String {
    attack_type.to_uppercase().replace('_', " ")
}

/// Truncates a payload for display on a single line
pub fn shorten(payload: &str, max_chars: usize) -> String {
    if payload.chars().count() <= max_chars {
        payload.to_string()
    } else {
        let head: String = payload.chars().take(max_chars).collect();
        format!("{head}...")
    }
}
