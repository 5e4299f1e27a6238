//! Test module for the Midnight game engine.
//!
//! Tests are organized by pipeline area; `test_utils` holds the shared
//! fixtures. Scripted tests claim every seat for a human so the AI stays
//! quiet and each night input can be controlled exactly.

#![cfg(test)]

pub mod ai_model;
pub mod determinism;
pub mod protections;
pub mod scenario;
pub mod test_utils;
pub mod view_projection;
pub mod vote_resolution;
