pub mod admin;
pub mod auth;
pub mod favorite;
pub mod link;
pub mod review;
