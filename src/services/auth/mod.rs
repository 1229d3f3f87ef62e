pub mod credential;
pub mod gate;

pub use gate::{AuthorizationGate, AuthorizationResult, DenyReason};
