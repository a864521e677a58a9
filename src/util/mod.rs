//! Shared helpers

pub mod ident;
