//! Brio Analyst - host crate for the data-science reasoning agent.
//!
//! Wires the [`agent_sdk`] reasoning loop to concrete services: an Ollama
//! chat client, a docker-backed Python sandbox, environment configuration,
//! and the command-line front end.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]

/// Single-question and interactive runners.
pub mod app;
/// Command-line arguments.
pub mod cli;
/// LLM inference providers.
pub mod inference;
/// Infrastructure components (config, telemetry).
pub mod infrastructure;
/// Code-execution sandboxes.
pub mod sandbox;
