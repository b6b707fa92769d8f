pub mod actor;
pub mod registry;

pub use actor::MatchCommand;
pub use registry::{MatchHandle, RegistryError, SessionRegistry};
