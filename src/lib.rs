//! Core library for the xml2xlsx command line application.
//!
//! The library turns hierarchical XML documents into relational workbooks:
//! one sheet per kind of record, with ancestor and foreign-key values copied
//! into each row. IO adapters live under [`io`], the element tree and entity
//! types inside [`model`], mapping documents in [`config`], entity extraction
//! and projection in [`flatten`], and the orchestration used by the CLI under
//! [`convert`] and [`template`].

pub mod config;
pub mod convert;
pub mod error;
pub mod flatten;
pub mod io;
pub mod model;
pub mod template;

pub use error::{Result, ToolError};
