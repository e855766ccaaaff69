pub mod camera;
pub mod card;
pub mod connection;
pub mod ui_state;
