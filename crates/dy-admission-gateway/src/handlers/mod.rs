//! Handlers served directly by the user router.
//!
//! Everything else (webhooks, system, app definitions, app data) is mounted
//! from sub-routers supplied by the embedder.

pub mod password;

pub use password::{change_password, ChangePasswordRequest};
