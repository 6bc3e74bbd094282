pub mod auth;
pub mod operation;
pub mod record;
pub mod status;
pub mod user;
