// Adapters layer: concrete implementations of the domain ports against GitHub.

pub mod assign;
pub mod github;
