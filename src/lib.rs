//! Face identity benchmarking toolkit
//!
//! This library backs four command-line tools: a face similarity comparator
//! that logs scores to CSV, a client for the InfiniteYou face-personalization
//! job API, and single-prompt and batch clients for a text-to-image
//! inference endpoint.

pub mod config;
pub mod logging;
pub mod models;
pub mod services;
