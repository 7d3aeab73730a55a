pub mod board;
pub mod catalog;
pub mod health;
pub mod metrics;
pub mod photos;
pub mod websocket;
