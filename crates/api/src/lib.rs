//! Folio API - command and query interface for editing documents.
//!
//! This crate defines the typed command language for Folio operations.
//! Commands represent user intent and are:
//! - Serializable (for recording, scripting, and the `apply` CLI command)
//! - Intent-based (what to do, not how to do it)
//!
//! # Example
//! ```
//! use api::{execute_command, Command, CommandResult};
//! use canvas::Editor;
//!
//! let mut editor = Editor::default();
//! let command: Command = serde_json::from_str(r#"{ "type": "add_shape", "shape": "rect" }"#).unwrap();
//! let result = execute_command(&mut editor, command);
//! assert!(matches!(result, CommandResult::Success { .. }));
//! ```

mod command;
mod executor;
mod query;
mod target;

pub use command::*;
pub use executor::{execute_command, execute_query};
pub use query::*;
pub use target::*;
