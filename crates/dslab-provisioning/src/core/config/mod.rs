//! Configuration.

pub mod options;
pub mod provisioning_config;
