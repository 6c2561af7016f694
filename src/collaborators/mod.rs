//! Collaborator boundaries consumed by the engine.
//!
//! The engine never talks to a model provider directly. Nodes receive a
//! [`ChatClient`] handle injected at construction; transports (HTTP APIs,
//! local inference, scripted fakes) live behind the trait.

mod chat;

pub use chat::{ChatClient, ModelError};
