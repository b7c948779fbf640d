// Application layer - use cases, background loops and configuration
// Presentation layer - CLI surface and process wiring

pub mod application;
pub mod presentation;
