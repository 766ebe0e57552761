pub mod accounts;
pub mod admin;
pub mod health;
pub mod sync;
