//! Authorization middleware applied per route in the router.
//!
//! Every rule funnels through [`has_role`] or an ownership check so the
//! role ladder lives in exactly one place.

pub(crate) mod catalog;
pub(crate) mod chats;
pub(crate) mod users;

use domain::users::Role;

/// The single role predicate. Admin does not implicitly satisfy a moderator
/// check; callers list every role that passes.
pub(crate) fn has_role(user: &domain::users::Model, allowed: &[Role]) -> bool {
    allowed.contains(&user.role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_role(role: Role) -> domain::users::Model {
        domain::users::Model {
            id: domain::Id::new_v4(),
            email: "a@x.com".to_string(),
            password: None,
            display_name: None,
            nickname: None,
            email_verified_at: None,
            role,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_has_role_matches_only_listed_roles() {
        let admin = user_with_role(Role::Admin);
        let reader = user_with_role(Role::User);

        assert!(has_role(&admin, &[Role::Admin]));
        assert!(!has_role(&reader, &[Role::Admin]));
        assert!(!has_role(&admin, &[Role::Moderator]));
        assert!(has_role(&admin, &[Role::Moderator, Role::Admin]));
    }
}
