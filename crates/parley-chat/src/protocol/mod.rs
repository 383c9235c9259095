//! Wire format types for backend API protocols
//!
//! Pure serde structs matching each backend's JSON format. They are only
//! used at the network boundary.

pub mod ollama;
pub mod openai;
