pub mod platform;

pub use platform::{PlatformEndpoints, PlatformHttpClient};
