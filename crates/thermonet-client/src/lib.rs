//! Thermonet Client
//!
//! Request/reply client for Thermonet sensor endpoints. It authenticates with
//! a password digest, reads temperatures and manages its session token over
//! any [`DatagramTransport`](thermonet_core::DatagramTransport).
//!
//! # Components
//!
//! - [`Client`]: Encrypts requests, waits for and classifies replies
//! - [`ClientConfig`]: Reply timeout and polling interval
//! - [`ClientError`]: Failures, split into fatal and transient

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;

pub use client::{Client, ClientConfig};
pub use error::{ClientError, Rejection};
pub use thermonet_core::{DatagramTransport, DegreeUnit, Environment};
