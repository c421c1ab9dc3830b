//! The `utils` module provides a collection of utility functions and common
//! definitions used across the relay.
//!
//! It centralizes the crate error type and the tracing bootstrap so every
//! other module reports failures and events the same way.

pub mod error;
pub mod logging;

pub use error::{RelayError, Result};

#[cfg(test)]
mod tests {
    use super::logging;

    #[test]
    fn logging_init_accepts_levels() {
        // Should not panic
        logging::init("info");
        logging::init("debug");
        logging::init("warn");
        logging::init("bogus");
    }

    #[test]
    fn parse_level_falls_back_to_info() {
        assert_eq!(logging::parse_level("WARNING"), tracing::Level::WARN);
        assert_eq!(logging::parse_level("trace"), tracing::Level::TRACE);
        assert_eq!(logging::parse_level(""), tracing::Level::INFO);
    }
}
