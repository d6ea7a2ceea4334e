//! Built-in client implementations
//!
//! - [`AzCliClient`] - shells out to the Azure CLI, reusing its login session

mod az_cli;

pub use az_cli::{AzCliClient, AzCliClientFactory};
