//! Core types and the normalization pass for legacy course records.
//!
//! This crate is free of database dependencies. Storage backends implement
//! [`store::CourseStore`]; the binary wires a backend into
//! [`normalize::CourseNormalizer`].

pub mod classify;
pub mod course;
pub mod error;
pub mod normalize;
pub mod store;
pub mod text;
pub mod user;

pub use error::{Error, Result};
