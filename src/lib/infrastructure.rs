//! Adapters for the communication ports

pub mod email;
pub mod files;
pub mod mailer;
pub mod views;
