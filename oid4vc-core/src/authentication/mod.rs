pub mod key_service;
pub mod sign;
