//! voxgate - key-holding proxy for text-to-speech and chat-completion APIs
//!
//! This library provides the core of the voxgate proxy: configuration,
//! key rotation, provider request translation and response normalization.

pub mod config;
pub mod error;
pub mod keys;
pub mod proxy;

pub use config::Config;
pub use error::{Error, Result};
