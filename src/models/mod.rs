pub mod board;
pub mod menu;
pub mod photo;
pub mod record;
