#![allow(dead_code)]

pub mod config;
pub mod mock_ollama;
pub mod mock_openai;
