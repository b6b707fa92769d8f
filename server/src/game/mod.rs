//! Authoritative match simulation. Everything under here is synchronous and
//! owned by exactly one match task.

pub mod advisor;
pub mod bot;
pub mod combat;
pub mod constants;
pub mod economy;
pub mod intent;
pub mod layout;
pub mod movement;
pub mod orchestrator;
pub mod types;
