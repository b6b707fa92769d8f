pub mod health;
pub mod lobbies;
pub mod matches;
pub mod routes;
