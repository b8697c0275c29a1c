//! Startup provisioning of the default rights, roles and accounts.

use sqlx::{Connection, SqliteConnection};

use crate::config::{AuthConfig, BootstrapConfig};
use crate::errors::{AppError, AppResult};
use crate::models::rbac::{ModelName, RightSpec};
use crate::store::{catalog, users};
use crate::token::TokenService;
use crate::utils::{hash_password, utc_now};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded,
    AlreadySeeded,
}

/// Seeds the admin and default roles, their rights, and one account per role.
/// Safe to run on every start: a uniqueness violation means the data is
/// already there, and the whole attempt is rolled back.
pub async fn seed(
    conn: &mut SqliteConnection,
    auth: &AuthConfig,
    bootstrap: &BootstrapConfig,
) -> AppResult<SeedOutcome> {
    let mut tx = conn.begin().await?;

    match seed_defaults(&mut tx, auth, bootstrap).await {
        Ok(()) => {
            tx.commit().await?;
            tracing::info!(admin_role = %auth.admin_role, default_role = %auth.default_role, "default roles and users seeded");
            Ok(SeedOutcome::Seeded)
        }
        Err(AppError::Conflict(reason)) => {
            tx.rollback().await?;
            tracing::info!(%reason, "defaults already seeded");
            Ok(SeedOutcome::AlreadySeeded)
        }
        Err(err) => Err(err),
    }
}

async fn seed_defaults(
    conn: &mut SqliteConnection,
    auth: &AuthConfig,
    bootstrap: &BootstrapConfig,
) -> AppResult<()> {
    let defaults = [
        (auth.admin_role.as_str(), true, "admin", bootstrap.admin_password.as_str()),
        (auth.default_role.as_str(), false, "user", bootstrap.user_password.as_str()),
    ];
    let tokens = TokenService::from_config(auth);

    for (role_name, may_write, _, _) in defaults {
        let role = catalog::insert_role(conn, role_name).await?;
        for model in ModelName::ALL {
            let mut spec = RightSpec::new(model).read().only_own();
            spec.write = may_write;
            let right = catalog::insert_right(conn, spec).await?;
            catalog::grant_right(conn, role.id, right.id).await?;
        }
    }

    for (role_name, _, user_name, password) in defaults {
        let password_hash = hash_password(password)?;
        let user = users::insert_with_role(conn, user_name, &password_hash, role_name, utc_now()).await?;
        tokens.issue(conn, user.id).await?;
    }

    Ok(())
}
