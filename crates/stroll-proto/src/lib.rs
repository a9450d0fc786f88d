pub mod events;
pub mod position;
