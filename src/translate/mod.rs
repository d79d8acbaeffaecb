//! Translation between the relay's single chat shape and each provider's
//! wire format.
//!
//! Requests go out through [`request::adapt`], replies come back through
//! [`response::extract`]. Everything in this module is pure (no I/O).

pub mod request;
pub mod response;
pub mod types;
