mod email;

pub use email::{EmailSender, SmtpSettings};
