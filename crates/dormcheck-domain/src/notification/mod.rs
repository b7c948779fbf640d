mod sender;
mod sign_result;

pub use sender::{NotificationMessage, NotificationSender};
pub use sign_result::SignResultNotice;
