pub mod db;
pub mod jsondb;
pub mod movies;
pub mod store;
