//! Prompt templates for every provider interaction

mod builder;
pub mod embedded;

pub use builder::PromptBuilder;
