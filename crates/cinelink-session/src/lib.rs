//! Session types for the Cinelink API.
//!
//! Provides the signed session token, the session cookie builders, and the
//! `Identity` extractor that handlers use to read the authenticated user.

pub mod cookie;
pub mod identity;
pub mod token;
