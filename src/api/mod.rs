//! Clients for hosted backends.
//!
//! - **rest**: PostgREST-style data store used for probing and timer writes

pub mod rest;

pub use rest::RestStore;
