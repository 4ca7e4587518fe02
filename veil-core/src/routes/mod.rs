pub mod chat;
pub mod discover;
pub mod health;
pub mod internal;
pub mod likes;
pub mod profile;
pub mod reveal;
