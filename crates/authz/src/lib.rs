//! Caller identity and the permission predicates guarding shelves.

use serde::Serialize;

/// Identifier of a user account.
pub type UserId = i64;

/// Capability granted to a user by the authenticating layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    /// May add books to and edit public shelves.
    EditShelfs,
}

impl Role {
    /// Parse a role name as sent by the proxy; unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "edit_shelfs" | "edit_shelves" => Some(Role::EditShelfs),
            _ => None,
        }
    }
}

/// The identity a request is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Caller {
    Anonymous,
    User { id: UserId, roles: Vec<Role> },
}

impl Caller {
    pub fn user(id: UserId, roles: impl IntoIterator<Item = Role>) -> Self {
        Caller::User {
            id,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn id(&self) -> Option<UserId> {
        match self {
            Caller::Anonymous => None,
            Caller::User { id, .. } => Some(*id),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        match self {
            Caller::Anonymous => false,
            Caller::User { roles, .. } => roles.contains(&role),
        }
    }

    /// Whether the caller may modify shelves visible to everyone.
    pub fn may_edit_public_shelves(&self) -> bool {
        self.has_role(Role::EditShelfs) || self.has_role(Role::Admin)
    }

    fn owns(&self, owner: UserId) -> bool {
        self.id() == Some(owner)
    }
}

/// What the guards need to know about a shelf.
pub trait ShelfAccess {
    fn owner_id(&self) -> UserId;
    fn is_public(&self) -> bool;
    fn name(&self) -> &str;
}

/// Private shelves are editable by their owner; public shelves by callers
/// holding [`Role::EditShelfs`].
pub fn can_edit_shelf(caller: &Caller, shelf: &impl ShelfAccess) -> bool {
    if !shelf.is_public() && !caller.owns(shelf.owner_id()) {
        tracing::error!(
            user_id = ?caller.id(),
            shelf = shelf.name(),
            "user not allowed to edit shelf"
        );
        return false;
    }
    if shelf.is_public() && !caller.may_edit_public_shelves() {
        tracing::info!(
            user_id = ?caller.id(),
            shelf = shelf.name(),
            "user not allowed to edit public shelves"
        );
        return false;
    }
    true
}

/// Public shelves are visible to everyone, private ones only to their owner.
pub fn can_view_shelf(caller: &Caller, shelf: &impl ShelfAccess) -> bool {
    if shelf.is_public() {
        return true;
    }
    if !caller.owns(shelf.owner_id()) {
        tracing::error!(
            user_id = ?caller.id(),
            shelf = shelf.name(),
            "user is unauthorized to view non-public shelf"
        );
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestShelf {
        owner: UserId,
        public: bool,
    }

    impl ShelfAccess for TestShelf {
        fn owner_id(&self) -> UserId {
            self.owner
        }

        fn is_public(&self) -> bool {
            self.public
        }

        fn name(&self) -> &str {
            "test"
        }
    }

    const PRIVATE: TestShelf = TestShelf {
        owner: 1,
        public: false,
    };
    const PUBLIC: TestShelf = TestShelf {
        owner: 1,
        public: true,
    };

    #[test]
    fn owner_edits_private_shelf() {
        assert!(can_edit_shelf(&Caller::user(1, []), &PRIVATE));
        assert!(!can_edit_shelf(&Caller::user(2, []), &PRIVATE));
        assert!(!can_edit_shelf(&Caller::Anonymous, &PRIVATE));
    }

    #[test]
    fn edit_shelfs_role_not_enough_for_foreign_private_shelf() {
        let editor = Caller::user(2, [Role::EditShelfs]);
        assert!(!can_edit_shelf(&editor, &PRIVATE));
    }

    #[test]
    fn public_shelf_requires_edit_role_even_for_owner() {
        assert!(!can_edit_shelf(&Caller::user(1, []), &PUBLIC));
        assert!(can_edit_shelf(&Caller::user(1, [Role::EditShelfs]), &PUBLIC));
        assert!(can_edit_shelf(&Caller::user(3, [Role::EditShelfs]), &PUBLIC));
        assert!(can_edit_shelf(&Caller::user(3, [Role::Admin]), &PUBLIC));
        assert!(!can_edit_shelf(&Caller::Anonymous, &PUBLIC));
    }

    #[test]
    fn view_permissions() {
        assert!(can_view_shelf(&Caller::Anonymous, &PUBLIC));
        assert!(can_view_shelf(&Caller::user(9, []), &PUBLIC));
        assert!(can_view_shelf(&Caller::user(1, []), &PRIVATE));
        assert!(!can_view_shelf(&Caller::user(9, []), &PRIVATE));
        assert!(!can_view_shelf(&Caller::Anonymous, &PRIVATE));
    }

    #[test]
    fn role_parsing() {
        assert_eq!(Role::parse(" Edit_Shelfs "), Some(Role::EditShelfs));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("download"), None);
    }
}
