//! End-to-end scenarios for citrus.
//!
//! [`functions`] registers custom function libraries the way a test suite would:
//! `#[citrus::function]` registrations picked up by discovery, and a hand-built
//! library of typed-parameter functions.
pub mod functions;

#[cfg(test)]
mod properties;
#[cfg(test)]
mod scenarios;
