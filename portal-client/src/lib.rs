#![cfg_attr(not(test), forbid(unsafe_code))]
#![deny(warnings, clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)]

//! Client core of the Agent Portal.
//!
//! [`session::SessionManager`] owns authentication state; the controllers
//! built by [`resources::Resources`] read API data against it and
//! [`actions::Actions`] performs the writes. [`routes`] decides which pages a
//! session may see.

pub mod actions;
pub mod api;
pub mod earnings;
pub mod error;
pub mod fetch;
pub mod resources;
pub mod routes;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use api::{HttpPortalApi, PortalApi};
pub use error::ClientError;
pub use fetch::{FetchController, FetchOutcome, FetchState, PendingFetch};
pub use session::{Session, SessionManager};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
