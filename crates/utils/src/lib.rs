//! Common utility for extended `std` types
//!
//! These are left public for convenience.
//!
//! Fixed-column card formats care a lot about whitespace, so most of the
//! helpers here are about measuring and classifying raw input lines. Prettier
//! scientific formatting for messages is also useful everywhere.

// Alias for the format! macro
pub use std::format as f;

// Modules
mod string_ext;
mod value_ext;

// Flatten
pub use string_ext::StringExt;
pub use value_ext::ValueExt;
