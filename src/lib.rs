//! `docmail`: turn documents with a YAML property header into mail items.
//!
//! This crate provides the header pipeline (locate, parse, coerce), the
//! property applier, and a conversion session that drives host
//! applications through the traits in [`host`].

pub mod config;
pub mod convert;
pub mod error;
pub mod host;
pub mod model;
pub mod parser;
