//! homehub: client for a personal home-hub backend.
//!
//! The dashboard's tabbed panels (home, assistant, projects, budget, data,
//! sensors, vault, dev) are driven by [`tabs::Dashboard`] over the REST
//! façade in [`api`], rendered as a view-model tree ([`view`]) that the CLI
//! prints as text and the preview server ([`web`]) serves as HTML.

pub mod api;
pub mod cli;
pub mod config;
pub mod http;
pub mod logging;
pub mod ping;
pub mod store;
pub mod tabs;
pub mod view;
pub mod web;
