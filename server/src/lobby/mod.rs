pub mod manager;
pub mod session;

pub use manager::LobbyManager;
pub use session::{LobbyError, LobbyMode, LobbySession, SessionId};
