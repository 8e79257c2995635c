//! Utility Module

pub mod time;
