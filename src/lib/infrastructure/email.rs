//! Email provider adapters

pub mod postmark;
pub mod smtp;
