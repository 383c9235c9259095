//! Conversion between chat types and backend wire formats

pub mod ollama;
pub mod openai;
