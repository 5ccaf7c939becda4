pub mod events;
pub mod handler;
pub mod registry;
pub mod rooms;
pub mod server;
