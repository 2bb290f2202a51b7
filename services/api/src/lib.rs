//! ClearPath API Library Crate
//!
//! The web service around the voice navigation core: configuration, shared
//! state, the voice session registry, the remote speech adapter, and the
//! pages and JSON routes for both learning tracks. The `api` binary is a thin
//! wrapper around this library.

pub mod config;
pub mod handlers;
pub mod media;
pub mod models;
pub mod pages;
pub mod router;
pub mod sessions;
pub mod speech;
pub mod state;
