//! Query specifications and their execution
//!
//! A [`QuerySpec`] is validated by [`QueryValidator`], digested by
//! [`crate::cache::query_digest`], and run through an [`Executor`], which
//! compiles its filters into the Data API filter tree on a cache miss.

pub mod executor;
pub mod filter;
pub mod models;
pub mod validate;

pub use executor::{ExecuteOptions, Executor};
pub use models::{
    FieldType, FilterKind, FilterSpec, OrderBySpec, QueryResult, QuerySpec, QueryTemplate,
    TemplateOverrides,
};
pub use validate::QueryValidator;
