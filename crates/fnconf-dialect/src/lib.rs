//! Dialect metadata and the resolver that maps abstract cases onto a
//! concrete engine's function surface.
//!
//! A [`DialectFile`] is the parsed configuration record. [`Dialect`] indexes
//! it once at construction and is read-only afterwards, so a
//! [`DialectLibrary`] can be shared across worker threads without locking.

pub mod file;
pub mod library;
pub mod resolver;
pub mod shape;

pub use file::{DialectFile, DialectFunction, DialectKernel};
pub use library::DialectLibrary;
pub use resolver::{Dialect, Resolution, ResolutionMode, SkipReason, SqlMapping};
pub use shape::FunctionShape;
