pub mod bot;
pub mod chatbot;
pub mod config;
pub mod error;
pub mod memory;
pub mod oauth;
pub mod openai;
pub mod shutdown;
pub mod slack;
pub mod types;

pub use bot::run;
