mod domain_service;
mod error;

pub use domain_service::SignInDomainService;
pub use error::SignInError;
