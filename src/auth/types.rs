//! Per-request authentication types.

use super::provider::{Session, User};

/// The resolved session attached to a protected request.
/// Lives only for the duration of the request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub session: Session,
    /// Identity derived from the session
    pub user: User,
}

impl From<Session> for RequestContext {
    fn from(session: Session) -> Self {
        let user = session.user.clone();
        Self { session, user }
    }
}
