//! Kling AI generative-media tools.
//!
//! Exposes the Kling REST API (text/image-to-video, image generation,
//! Omni multimodal generation, custom elements) as a suite of callable
//! tools. Each invocation issues one signed token, performs one HTTPS
//! call without retries, and streams ordered messages (text, the raw
//! JSON envelope, optional downloaded media) to a [`emit::MessageSink`].

pub mod auth;
pub mod client;
pub mod config;
pub mod emit;
pub mod error;
pub mod media;
pub mod params;
pub mod provider;
pub mod tools;
pub mod utils;
