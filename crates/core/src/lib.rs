//! Core library for foodcat
//!
//! This crate implements the **Functional Core** of the foodcat application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The foodcat project uses a two-crate architecture:
//!
//! - **`foodcat_core`** (this crate): Pure transformation functions with zero I/O
//! - **`foodcat`**: HTTP access, the CLI, the MCP server and the effect runner
//!   that executes the session's commands (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no external state mutations
//! - **Testable**: Can be tested with simple fixture data, no mocking required
//!
//! # Module Organization
//!
//! - [`api`]: Request URLs, response shapes and barcode validation for the
//!   Open Food Facts API
//! - [`product`]: Product and category models, tag filtering, grade colours and
//!   the list/detail view models
//! - [`nutrients`]: Nutrient table derivation for the detail view
//! - [`session`]: The search session state machine driving the product list
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use foodcat_core::session::{update, Command, Event, SearchSession};
//!
//! let (session, commands) = update(SearchSession::default(), Event::Mounted);
//!
//! // The shell runs the commands and feeds the results back as events
//! assert!(matches!(commands[0], Command::Search(_)));
//! assert!(matches!(commands[1], Command::ListCategories));
//! ```

pub mod api;
pub mod nutrients;
pub mod product;
pub mod session;
