//! Core model and policies.

pub mod cloud;
pub mod common;
pub mod config;
pub mod cost_model;
pub mod error;
pub mod instance;
pub mod job;
pub mod load_balancer;
pub mod load_balancers;
pub mod odometer;
pub mod plan;
pub mod provisioning_policies;
pub mod provisioning_policy;
pub mod session;
