use super::error::SignInError;
use crate::platform::SignInReply;
use crate::session::Session;
use crate::shared::AccountId;

/// Pure rules around a single sign-in attempt
pub struct SignInDomainService;

impl SignInDomainService {
    /// Message the platform returns when the activity was already signed today
    pub const ALREADY_SIGNED_IN: &'static str = "该活动已经签到成功";

    /// The session must exist and carry cookies before anything is submitted
    pub fn require_usable_session(
        account_id: &AccountId,
        session: Option<Session>,
    ) -> Result<Session, SignInError> {
        let session =
            session.ok_or_else(|| SignInError::SessionNotFound(account_id.to_string()))?;

        if !session.is_usable() {
            return Err(SignInError::EmptyCookies(account_id.to_string()));
        }

        Ok(session)
    }

    /// Success when the flag is set or the platform says it is already done
    pub fn classify(reply: &SignInReply) -> Result<(), SignInError> {
        if reply.is_ok || reply.message == Self::ALREADY_SIGNED_IN {
            Ok(())
        } else {
            Err(SignInError::Rejected(reply.message.clone()))
        }
    }
}
