//! Bundled email templates

pub mod error_report;
