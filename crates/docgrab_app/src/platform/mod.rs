//! Terminal and stdio integration for the `docgrab` binary.

pub mod bridge;
pub mod config;
pub mod render;
pub mod session;
