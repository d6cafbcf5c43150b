// smartsh/src/lib.rs
//! # Smartsh CLI Application
//!
//! This crate provides the command-line surface for the Smartsh shell
//! assistant: the recording proxy session (pty allocation, single
//! instance locking, the copy loop into the capture log), the provider
//! HTTP clients, provider configuration handling, and the suggestion
//! command that glues them to the `smartsh-core` redaction pipeline.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logger;
pub mod providers;
pub mod session;
