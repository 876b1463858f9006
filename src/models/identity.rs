//! Request identity
//!
//! Every request resolves to exactly one `Identity`. Ownership checks go
//! through [`Identity::owns`], which never matches for anonymous callers.

use super::User;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(User),
}

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Authenticated(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user().map(|u| u.id)
    }

    /// True only for an authenticated caller whose id equals `author_id`
    pub fn owns(&self, author_id: i64) -> bool {
        self.user().is_some_and(|u| u.is_author_of(author_id))
    }
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Identity::Authenticated(user)
    }
}

impl From<Option<User>> for Identity {
    fn from(user: Option<User>) -> Self {
        user.map(Identity::Authenticated).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn user(id: i64) -> User {
        let mut user = User::new(format!("user{}", id), "hash".to_string());
        user.id = id;
        user
    }

    #[test]
    fn test_anonymous_has_no_user() {
        let identity = Identity::Anonymous;
        assert!(!identity.is_authenticated());
        assert!(identity.user().is_none());
        assert_eq!(identity.user_id(), None);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Identity::from(None), Identity::Anonymous);
        assert!(Identity::from(Some(user(1))).is_authenticated());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Anonymous never owns anything, including ids that look like defaults.
        #[test]
        fn anonymous_never_owns(author_id in any::<i64>()) {
            prop_assert!(!Identity::Anonymous.owns(author_id));
        }

        /// An authenticated caller owns exactly the entities carrying its id.
        #[test]
        fn authenticated_owns_only_own_id(id in 1i64..1000, author_id in 1i64..1000) {
            let identity = Identity::from(user(id));
            prop_assert_eq!(identity.owns(author_id), id == author_id);
        }
    }
}
