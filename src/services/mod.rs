// src/services/mod.rs

pub mod aggregate;
pub mod chatbot;
pub mod grading;
pub mod notes_store;
