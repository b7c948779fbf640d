mod client;
mod error;

pub use client::{
    Activity, CaptchaChallenge, CaptchaSolver, LoginReply, PlatformClient, SignInForm,
    SignInReply,
};
pub use error::PlatformError;
