//! sea-orm entities for the database backend.
//!
//! Column shapes mirror the flat-file records so the two backends stay
//! interchangeable behind the repository traits.

pub mod favorites;
pub mod links;
pub mod reviews;
pub mod users;
