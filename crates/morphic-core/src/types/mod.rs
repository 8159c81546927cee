//! Core type definitions used across the Morphic workspace.

pub mod identifier;

pub use identifier::validate_identifier;
