//! Domain models for the portfolio catalog.
//!
//! - [`Project`]: a piece of work, optionally filed under one category.
//! - [`Category`]: a named group of projects. Names are unique.
//!
//! Update inputs use [`Patch`] per field so that "leave as is" and
//! "overwrite with an empty value" stay distinguishable.

mod category;
mod patch;
mod project;

pub use category::*;
pub use patch::*;
pub use project::*;
