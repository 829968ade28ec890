pub mod health;
pub mod me;
pub mod password_reset;
pub mod signin;
pub mod su;
pub mod token;
pub mod types;
