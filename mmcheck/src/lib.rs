//! MiniMax API capability probe.
//!
//! This crate verifies an account's access to the MiniMax
//! conversational-AI and speech-synthesis HTTP API. It exposes a small
//! client for the chat-completion and text-to-speech endpoints and a
//! set of capability checks (chat, speech synthesis, image
//! understanding, role-play) that classify each outcome into an
//! explicit result instead of letting errors escape.

pub mod chat;
pub mod check;
pub mod client;
pub mod error;
pub mod message;
pub mod speech;
pub mod transport;

pub use client::MiniMaxClient;
pub use error::{ApiError, Error, Result};
