pub mod auth;
pub mod registry;
