//! Common utilities and types shared across Room Pass components.

#![warn(clippy::pedantic)]

/// Module for wire types exchanged between the issuer and its clients
pub mod types;

/// Module for logging configuration and subscriber setup
pub mod observability;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for access token claims, capability grants and unverified decoding
pub mod jwt;
