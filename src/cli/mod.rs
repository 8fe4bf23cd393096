//! CLI module
//!
//! Command-line interface over the client.
//!
//! # Commands
//!
//! - `user` - Show the authenticated user, or another user by id
//! - `space` - Show one space
//! - `spaces` - List the authenticated user's spaces
//! - `orgs` - List organizations
//! - `org-spaces` - List the spaces of an organization

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, PageArgs};
pub use runner::Runner;
