//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod turn_controller;
