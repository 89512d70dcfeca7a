//! Shared utilities for the Hiroba chat client and its tests.

pub mod logger;
pub mod time;
