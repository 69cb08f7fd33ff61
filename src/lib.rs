#![doc = "The `taskpilot` library crate."]
#![doc = ""]
#![doc = "This crate contains the domain models, authentication mechanisms, service"]
#![doc = "layer, routing configuration, and error handling for the TaskPilot API."]
#![doc = "It is used by the main binary (`main.rs`) to construct and run the server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
