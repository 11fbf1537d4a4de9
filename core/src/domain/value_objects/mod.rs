//! Value objects representing immutable domain concepts.

pub mod identifier;

pub use identifier::Identifier;
