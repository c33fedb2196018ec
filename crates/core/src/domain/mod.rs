pub mod conversation;
pub mod department;
pub mod order;
pub mod record;
pub mod room;
pub mod room_service;
pub mod session;
