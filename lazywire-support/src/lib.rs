//! # Lazywire Support
//!
//! Shared utilities for the lazywire crates.
//!
//! This crate provides:
//! - Text rendering for provider descriptions and error messages

pub mod rendering;
