//! plate-snap library crate.
//!
//! Captures webcam stills and submits them to a plate recognition
//! server; this module exposes the internal components for integration
//! testing.

pub mod camera;
pub mod cli;
pub mod config;
pub mod display;
pub mod session;
pub mod snapshot;
pub mod upload;
pub mod verdict;
