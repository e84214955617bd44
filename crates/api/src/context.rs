use stockroom_auth::{Principal, Role};
use stockroom_core::UserId;

/// Authenticated caller for a request.
///
/// Inserted into request extensions by the bearer middleware only when a
/// valid token was presented; anonymous requests carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    principal: Principal,
}

impl CallerContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn is_admin(&self) -> bool {
        self.principal.is_admin()
    }
}

/// Borrow the caller out of an optional extractor.
pub fn caller_ref(caller: &Option<axum::Extension<CallerContext>>) -> Option<&CallerContext> {
    caller.as_ref().map(|axum::Extension(c)| c)
}
