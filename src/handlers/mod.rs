// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod chatbot;
pub mod exam;
pub mod home;
pub mod notes;
