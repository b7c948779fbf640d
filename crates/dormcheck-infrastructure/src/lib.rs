// Infrastructure layer - Technical implementations
// Depends on domain layer, implements its interfaces

pub mod captcha;
pub mod config;
pub mod http;
pub mod logging;
pub mod notification;
pub mod persistence;
pub mod security;
