pub mod health;
pub mod validation;
pub mod ws;
