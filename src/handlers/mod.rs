// handlers/mod.rs - request handlers grouped by resource
//
// Handlers assume the gate layers for their route already ran; any identity
// they need is read from the request extensions.

pub mod auth;
pub mod groups;
pub mod health;
pub mod members;
