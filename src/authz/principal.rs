use crate::models::advertisement::Advertisement;
use crate::models::rbac::{ModelName, RoleGrant};
use crate::models::user::User;

/// The acting user together with the roles and rights loaded for it.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: i64,
    pub grants: Vec<RoleGrant>,
}

impl Principal {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            grants: Vec::new(),
        }
    }

    pub fn with_grants(mut self, grants: impl IntoIterator<Item = RoleGrant>) -> Self {
        self.grants = grants.into_iter().collect();
        self
    }

    /// True when a role named `admin_role` carries any right on `model`.
    /// The right's flags are not consulted.
    pub fn has_admin_override(&self, admin_role: &str, model: ModelName) -> bool {
        self.grants
            .iter()
            .filter(|grant| grant.role.name == admin_role)
            .flat_map(|grant| grant.rights.iter())
            .any(|right| right.spec.model == model)
    }

    pub fn owns(&self, target: &ProtectedEntity<'_>) -> bool {
        target.owner_id() == Some(self.user_id)
    }
}

/// A protected resource instance an action is requested on.
#[derive(Debug, Clone, Copy)]
pub enum ProtectedEntity<'a> {
    User(&'a User),
    Advertisement(&'a Advertisement),
}

impl ProtectedEntity<'_> {
    pub fn model(&self) -> ModelName {
        match self {
            ProtectedEntity::User(_) => ModelName::User,
            ProtectedEntity::Advertisement(_) => ModelName::Advertisement,
        }
    }

    /// Id of the user owning this instance. `None` never matches a user; a new
    /// variant without an owner field should return it.
    pub fn owner_id(&self) -> Option<i64> {
        match self {
            ProtectedEntity::User(user) => Some(user.id),
            ProtectedEntity::Advertisement(ad) => Some(ad.user_id),
        }
    }
}

impl<'a> From<&'a User> for ProtectedEntity<'a> {
    fn from(user: &'a User) -> Self {
        ProtectedEntity::User(user)
    }
}

impl<'a> From<&'a Advertisement> for ProtectedEntity<'a> {
    fn from(ad: &'a Advertisement) -> Self {
        ProtectedEntity::Advertisement(ad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::{Right, RightSpec, Role};
    use chrono::Utc;

    fn grant(role: &str, rights: Vec<RightSpec>) -> RoleGrant {
        RoleGrant {
            role: Role {
                id: 1,
                name: role.to_string(),
            },
            rights: rights
                .into_iter()
                .enumerate()
                .map(|(i, spec)| Right { id: i as i64 + 1, spec })
                .collect(),
        }
    }

    #[test]
    fn user_targets_are_owned_by_themselves() {
        let user = User {
            id: 4,
            name: "ada".to_string(),
            created_at: Utc::now(),
        };
        let target = ProtectedEntity::from(&user);
        assert_eq!(target.model(), ModelName::User);
        assert_eq!(target.owner_id(), Some(4));
        assert!(Principal::new(4).owns(&target));
        assert!(!Principal::new(5).owns(&target));
    }

    #[test]
    fn advertisements_are_owned_by_their_author() {
        let ad = Advertisement {
            id: 10,
            title: "bike".to_string(),
            description: "red".to_string(),
            price: 10.0,
            user_id: 7,
            created_at: Utc::now(),
        };
        let target = ProtectedEntity::from(&ad);
        assert_eq!(target.model(), ModelName::Advertisement);
        assert!(Principal::new(7).owns(&target));
        assert!(!Principal::new(10).owns(&target));
    }

    #[test]
    fn admin_override_needs_a_right_on_the_model() {
        let principal = Principal::new(1).with_grants(vec![grant(
            "admin",
            vec![RightSpec::new(ModelName::User).read().only_own()],
        )]);

        assert_eq!(principal.grants[0].role.name, "admin");
        assert!(principal.has_admin_override("admin", ModelName::User));
        assert!(!principal.has_admin_override("admin", ModelName::Advertisement));
        assert!(!principal.has_admin_override("root", ModelName::User));
    }

    #[test]
    fn non_admin_roles_never_override() {
        let principal = Principal::new(1).with_grants(vec![grant(
            "user",
            vec![RightSpec::new(ModelName::User).read().write()],
        )]);
        assert!(!principal.has_admin_override("admin", ModelName::User));
    }
}
