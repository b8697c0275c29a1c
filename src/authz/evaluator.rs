use async_trait::async_trait;
use sqlx::SqliteConnection;

use super::principal::{Principal, ProtectedEntity};
use crate::config::AuthConfig;
use crate::errors::{AppError, AppResult};
use crate::models::rbac::{Action, ModelName};
use crate::models::user::User;
use crate::store::catalog;

/// Source of the role and right data the engine evaluates against.
#[async_trait]
pub trait RightsStore: Send {
    /// Loads the user's roles together with their rights.
    async fn load_principal(&mut self, user_id: i64) -> AppResult<Principal>;

    /// Counts distinct rights reachable from the user that permit `action` on
    /// `model`; own-only rights count only when `acting_is_owner`.
    async fn count_matching_rights(
        &mut self,
        user_id: i64,
        model: ModelName,
        action: Action,
        acting_is_owner: bool,
    ) -> AppResult<i64>;
}

#[async_trait]
impl RightsStore for SqliteConnection {
    async fn load_principal(&mut self, user_id: i64) -> AppResult<Principal> {
        let grants = catalog::load_role_grants(self, user_id).await?;
        Ok(Principal::new(user_id).with_grants(grants))
    }

    async fn count_matching_rights(
        &mut self,
        user_id: i64,
        model: ModelName,
        action: Action,
        acting_is_owner: bool,
    ) -> AppResult<i64> {
        catalog::count_matching_rights(self, user_id, model, action, acting_is_owner).await
    }
}

/// Decides whether a user may read or write a protected entity.
///
/// Evaluation order:
/// 1. admin role holding any right on the target's model -> allow
/// 2. any right on the model granting the action, own-only rights counting
///    only when the actor owns the target -> allow
/// 3. deny
#[derive(Debug, Clone)]
pub struct Authorizer {
    admin_role: String,
}

impl Authorizer {
    pub fn new(admin_role: impl Into<String>) -> Self {
        Self {
            admin_role: admin_role.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.admin_role.clone())
    }

    /// Query mode: returns the decision without raising.
    pub async fn authorize<S>(
        &self,
        store: &mut S,
        actor: &User,
        target: ProtectedEntity<'_>,
        action: Action,
    ) -> AppResult<bool>
    where
        S: RightsStore + ?Sized,
    {
        let model = target.model();
        let principal = store.load_principal(actor.id).await?;

        if principal.has_admin_override(&self.admin_role, model) {
            tracing::debug!(user_id = actor.id, model = %model, action = %action, "admin override");
            return Ok(true);
        }

        let acting_is_owner = principal.owns(&target);
        let matching = store
            .count_matching_rights(actor.id, model, action, acting_is_owner)
            .await?;

        let allowed = matching > 0;
        tracing::debug!(
            user_id = actor.id,
            model = %model,
            action = %action,
            owner = acting_is_owner,
            matching,
            allowed,
            "rights evaluated"
        );
        Ok(allowed)
    }

    /// Require mode: a denial becomes `Forbidden`.
    pub async fn require<S>(
        &self,
        store: &mut S,
        actor: &User,
        target: ProtectedEntity<'_>,
        action: Action,
    ) -> AppResult<()>
    where
        S: RightsStore + ?Sized,
    {
        if self.authorize(store, actor, target, action).await? {
            Ok(())
        } else {
            Err(AppError::forbidden())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;
    use crate::models::advertisement::Advertisement;
    use crate::models::rbac::{Right, RightSpec, Role, RoleGrant};

    /// Evaluates the rule query over in-memory grants.
    #[derive(Default)]
    struct InMemoryRights {
        grants: HashMap<i64, Vec<RoleGrant>>,
    }

    impl InMemoryRights {
        fn with_role(mut self, user_id: i64, role: &str, rights: Vec<RightSpec>) -> Self {
            let grant = RoleGrant {
                role: Role {
                    id: self.grants.len() as i64 + 1,
                    name: role.to_string(),
                },
                rights: rights
                    .into_iter()
                    .enumerate()
                    .map(|(i, spec)| Right { id: i as i64 + 1, spec })
                    .collect(),
            };
            self.grants.entry(user_id).or_default().push(grant);
            self
        }
    }

    #[async_trait]
    impl RightsStore for InMemoryRights {
        async fn load_principal(&mut self, user_id: i64) -> AppResult<Principal> {
            let grants = self.grants.get(&user_id).cloned().unwrap_or_default();
            Ok(Principal::new(user_id).with_grants(grants))
        }

        async fn count_matching_rights(
            &mut self,
            user_id: i64,
            model: ModelName,
            action: Action,
            acting_is_owner: bool,
        ) -> AppResult<i64> {
            let count = self
                .grants
                .get(&user_id)
                .into_iter()
                .flatten()
                .flat_map(|grant| grant.rights.iter())
                .filter(|right| right.spec.grants(model, action, acting_is_owner))
                .count();
            Ok(count as i64)
        }
    }

    fn user(id: i64) -> User {
        User {
            id,
            name: format!("user-{id}"),
            created_at: Utc::now(),
        }
    }

    fn ad_owned_by(user_id: i64) -> Advertisement {
        Advertisement {
            id: 100 + user_id,
            title: "bike".to_string(),
            description: "red".to_string(),
            price: 10.0,
            user_id,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_user_without_roles_is_denied() {
        let authorizer = Authorizer::new("admin");
        let mut store = InMemoryRights::default();
        let actor = user(1);
        let ad = ad_owned_by(1);

        for action in [Action::Read, Action::Write] {
            assert!(!authorizer.authorize(&mut store, &actor, (&actor).into(), action).await.unwrap());
            assert!(!authorizer.authorize(&mut store, &actor, (&ad).into(), action).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_admin_override_ignores_flags_and_ownership() {
        let authorizer = Authorizer::new("admin");
        let mut store = InMemoryRights::default().with_role(
            1,
            "admin",
            vec![RightSpec::new(ModelName::Advertisement).read().only_own()],
        );
        let admin = user(1);
        let foreign_ad = ad_owned_by(2);

        assert!(authorizer.authorize(&mut store, &admin, (&foreign_ad).into(), Action::Write).await.unwrap());
        assert!(authorizer.authorize(&mut store, &admin, (&foreign_ad).into(), Action::Read).await.unwrap());

        // No right on the User model under the admin role: no override there.
        let other = user(2);
        assert!(!authorizer.authorize(&mut store, &admin, (&other).into(), Action::Read).await.unwrap());
    }

    #[tokio::test]
    async fn test_own_only_write_is_scoped_to_owner() {
        let authorizer = Authorizer::new("admin");
        let mut store = InMemoryRights::default()
            .with_role(1, "user", vec![RightSpec::new(ModelName::Advertisement).write().only_own()])
            .with_role(2, "user", vec![RightSpec::new(ModelName::Advertisement).write().only_own()]);
        let owner = user(1);
        let stranger = user(2);
        let ad = ad_owned_by(1);

        assert!(authorizer.authorize(&mut store, &owner, (&ad).into(), Action::Write).await.unwrap());
        assert!(!authorizer.authorize(&mut store, &stranger, (&ad).into(), Action::Write).await.unwrap());
    }

    #[tokio::test]
    async fn test_unscoped_read_ignores_ownership() {
        let authorizer = Authorizer::new("admin");
        let mut store =
            InMemoryRights::default().with_role(1, "auditor", vec![RightSpec::new(ModelName::User).read()]);
        let auditor = user(1);
        let other = user(2);

        assert!(authorizer.authorize(&mut store, &auditor, (&other).into(), Action::Read).await.unwrap());
        assert!(authorizer.authorize(&mut store, &auditor, (&auditor).into(), Action::Read).await.unwrap());
        assert!(!authorizer.authorize(&mut store, &auditor, (&other).into(), Action::Write).await.unwrap());
    }

    #[tokio::test]
    async fn test_require_turns_denial_into_forbidden() {
        let authorizer = Authorizer::new("admin");
        let mut store = InMemoryRights::default();
        let actor = user(1);
        let other = user(2);

        let err = authorizer
            .require(&mut store, &actor, (&other).into(), Action::Write)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_override_uses_configured_admin_role() {
        let authorizer = Authorizer::new("superuser");
        let mut store = InMemoryRights::default().with_role(
            1,
            "admin",
            vec![RightSpec::new(ModelName::User).read().only_own()],
        );
        let actor = user(1);
        let other = user(2);

        assert!(!authorizer.authorize(&mut store, &actor, (&other).into(), Action::Read).await.unwrap());
    }
}
