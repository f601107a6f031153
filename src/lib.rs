// ABOUTME: Library root for keyward - SSH authentication for git clone and fetch.
// ABOUTME: The main binary is in main.rs.

pub mod auth;
pub mod config;
pub mod error;
pub mod vcs;
