//! Bridge to the external generative-language API: the chat assistant,
//! monthly insight, and saving suggestion features.

pub mod assistant;
pub mod client;

pub use assistant::AssistantService;
pub use client::GenerativeClient;
