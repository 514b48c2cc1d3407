//! The dynamic memory registry.
//!
//! A `Session` is the resolved working state for one owner. Roles such as
//! "SemanticMemory" are activated into the session's entity arena, granted
//! names from the owner's persisted vocabulary, and invoked through the
//! `Dispatcher` against a closed table of capability implementations.

pub mod builtin;
pub mod dispatcher;
pub mod entity;
pub mod handler;
pub mod registry;
pub mod session;
