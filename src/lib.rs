pub mod api;
pub mod display;
pub mod link;
pub mod model;
pub mod orchestrator;
pub mod retry;
pub mod settings;
pub mod status;

#[cfg(test)]
mod testing;

pub use api::{hash_password, Client, Error};
pub use orchestrator::Orchestrator;
