//! Utilities module
//!
//! Contains error handling, logging helpers and exact rational arithmetic

pub mod error;
pub mod logging;
pub mod rational;

pub use rational::Rational;
