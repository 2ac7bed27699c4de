//! Signed, time-bounded access tokens.

pub mod claims;
pub mod secret;
pub mod service;
