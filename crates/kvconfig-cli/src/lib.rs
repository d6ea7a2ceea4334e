//! kvconfig command line application
//!
//! Argument parsing lives in [`cli`], command implementations in
//! [`commands`]. The binary only wires them together.

pub mod cli;
pub mod commands;
pub mod document;
