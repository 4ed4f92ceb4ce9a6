//! Foundation types for Content Farm Terminator.
//!
//! This crate holds what both browsing contexts agree on: the error type,
//! tab and query identifiers, the closed command set exchanged between the
//! warning page and the privileged background context, and the shared
//! configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod message;

pub use config::{CftConfig, DisplayMode};
pub use error::{CftError, Result};
pub use ids::{QueryId, TabId};
pub use message::{Ack, BackgroundMessage, PageMessage};
