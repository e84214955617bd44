use thiserror::Error;

use crate::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: no authenticated identity")]
    MissingIdentity,

    #[error("forbidden: role '{0}' is not permitted")]
    RoleNotPermitted(Role),
}

/// Role guard for a route.
///
/// `required` is the route's declared role set. An empty set means the route
/// declares no restriction and is allowed outright. Otherwise the caller must
/// carry an identity whose role is a member of the set.
///
/// - No IO
/// - No panics
pub fn authorize(caller_role: Option<Role>, required: &[Role]) -> Result<(), AuthzError> {
    if required.is_empty() {
        return Ok(());
    }

    let role = caller_role.ok_or(AuthzError::MissingIdentity)?;
    if required.contains(&role) {
        Ok(())
    } else {
        Err(AuthzError::RoleNotPermitted(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_requirement_allows_everyone() {
        assert_eq!(authorize(Some(Role::User), &[]), Ok(()));
        assert_eq!(authorize(Some(Role::Admin), &[]), Ok(()));
        assert_eq!(authorize(None, &[]), Ok(()));
    }

    #[test]
    fn member_role_is_allowed() {
        assert_eq!(authorize(Some(Role::Admin), &[Role::Admin]), Ok(()));
        assert_eq!(authorize(Some(Role::User), &[Role::Admin, Role::User]), Ok(()));
    }

    #[test]
    fn non_member_role_is_forbidden() {
        assert_eq!(
            authorize(Some(Role::User), &[Role::Admin]),
            Err(AuthzError::RoleNotPermitted(Role::User))
        );
    }

    #[test]
    fn missing_identity_is_forbidden() {
        assert_eq!(authorize(None, &[Role::Admin]), Err(AuthzError::MissingIdentity));
        assert_eq!(authorize(None, &Role::ALL), Err(AuthzError::MissingIdentity));
    }
}
