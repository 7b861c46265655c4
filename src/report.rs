//! Key/value property reports.
//!
//! Every configuration object and the simulation itself describe themselves as a
//! [`Report`]; a single `Display` implementation renders all of them as an
//! aligned two-column table.

use colored::Colorize;
use std::fmt;

pub const KEY_WIDTH: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum ReportValue {
    Text(String),
    Integer(u64),
    Float(f64),
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportValue::Text(text) => f.write_str(text),
            ReportValue::Integer(value) => write!(f, "{value}"),
            ReportValue::Float(value) => {
                let magnitude = value.abs();
                if *value == 0.0 || (1e-3..1e4).contains(&magnitude) {
                    write!(f, "{value}")
                } else {
                    write!(f, "{value:.4e}")
                }
            }
        }
    }
}

impl From<&str> for ReportValue {
    fn from(value: &str) -> Self {
        ReportValue::Text(value.to_string())
    }
}

impl From<String> for ReportValue {
    fn from(value: String) -> Self {
        ReportValue::Text(value)
    }
}

impl From<f64> for ReportValue {
    fn from(value: f64) -> Self {
        ReportValue::Float(value)
    }
}

impl From<u64> for ReportValue {
    fn from(value: u64) -> Self {
        ReportValue::Integer(value)
    }
}

impl From<usize> for ReportValue {
    fn from(value: usize) -> Self {
        ReportValue::Integer(value as u64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    rows: Vec<(String, ReportValue)>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, key: impl Into<String>, value: impl Into<ReportValue>) -> Self {
        self.rows.push((key.into(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&ReportValue> {
        self.rows.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title.bold())?;
        for (key, value) in &self.rows {
            // pad before colouring so escape codes don't eat the width
            let padded = format!("{:<width$}", key, width = KEY_WIDTH);
            writeln!(f, "{} {}", padded.cyan(), value)?;
        }
        Ok(())
    }
}

/// Anything that can describe itself as a property report.
pub trait Summary {
    fn summary(&self) -> Report;
}
