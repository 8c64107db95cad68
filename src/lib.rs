pub mod actors;
pub mod cli;
pub mod error;
pub mod github;
pub mod status;
pub mod store;
pub mod trigger;
pub mod types;
pub mod view;
