//! Resolved caller identity.

use crate::db::User;

/// Who is making a request.
///
/// Handlers match on this instead of comparing role strings, so every
/// permission decision goes through [`Caller::is_admin`] or
/// [`Caller::can_manage`].
#[derive(Debug, Clone, Default)]
pub enum Caller {
    /// No (usable) bearer token.
    #[default]
    Anonymous,
    /// A regular active account.
    User(User),
    /// An active administrator account.
    Admin(User),
}

impl Caller {
    /// Classify an authenticated user by role.
    pub fn from_user(user: User) -> Self {
        if user.is_admin() {
            Caller::Admin(user)
        } else {
            Caller::User(user)
        }
    }

    /// The authenticated user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Caller::Anonymous => None,
            Caller::User(user) | Caller::Admin(user) => Some(user),
        }
    }

    /// The authenticated user's id, if any.
    pub fn id(&self) -> Option<i64> {
        self.user().map(|u| u.id)
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Caller::Anonymous)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Caller::Admin(_))
    }

    /// Whether the caller is the user with this id.
    pub fn owns(&self, owner_id: i64) -> bool {
        self.id() == Some(owner_id)
    }

    /// Whether the caller may modify a resource owned by `owner_id`.
    pub fn can_manage(&self, owner_id: i64) -> bool {
        self.is_admin() || self.owns(owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Role;

    fn user(id: i64, role: Role) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password: String::new(),
            full_name: "Test User".to_string(),
            bio: String::new(),
            avatar: String::new(),
            role,
            is_active: true,
            last_login: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_from_user() {
        assert!(Caller::from_user(user(1, Role::Admin)).is_admin());
        assert!(!Caller::from_user(user(1, Role::User)).is_admin());
    }

    #[test]
    fn test_anonymous() {
        let caller = Caller::Anonymous;
        assert!(caller.is_anonymous());
        assert_eq!(caller.id(), None);
        assert!(!caller.owns(1));
        assert!(!caller.can_manage(1));
    }

    #[test]
    fn test_can_manage() {
        let owner = Caller::from_user(user(1, Role::User));
        let stranger = Caller::from_user(user(2, Role::User));
        let admin = Caller::from_user(user(3, Role::Admin));

        assert!(owner.can_manage(1));
        assert!(!stranger.can_manage(1));
        assert!(admin.can_manage(1));
        assert!(!admin.owns(1));
    }
}
