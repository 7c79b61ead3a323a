//! Core record types shared by the resolver, statement builder and
//! execution adapters.
//!
//! - [`literal`]: semantic type tags and literal values
//! - [`case`]: abstract test vectors and their expected outcomes
//! - [`value`]: values returned by an engine under test

pub mod case;
pub mod literal;
pub mod value;

pub use case::{Case, ExpectedResult, Kernel};
pub use literal::{Literal, LiteralType, LiteralValue, UnknownLiteralType};
pub use value::{SqlValue, TemporalKind, TemporalValue};
