//! Domain: message composition and the ports it depends on

pub mod communication;
