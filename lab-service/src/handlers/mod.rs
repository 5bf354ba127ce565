//! HTTP handlers for lab-service.

pub mod auth;
pub mod components;
pub mod notifications;
pub mod records;
pub mod system;
pub mod users;
