//! Rights catalog: roles, rights and the associations that link them to users.

use std::collections::BTreeMap;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection};

use crate::errors::{AppError, AppResult};
use crate::models::rbac::{Action, ModelName, Right, RightSpec, Role, RoleGrant};

#[derive(Debug, FromRow)]
struct RightRow {
    id: i64,
    read: bool,
    write: bool,
    only_own: bool,
    model: String,
}

impl TryFrom<RightRow> for Right {
    type Error = AppError;

    fn try_from(row: RightRow) -> Result<Self, Self::Error> {
        Ok(Right {
            id: row.id,
            spec: RightSpec {
                read: row.read,
                write: row.write,
                only_own: row.only_own,
                model: row.model.parse()?,
            },
        })
    }
}

pub async fn find_role_by_name(conn: &mut SqliteConnection, name: &str) -> AppResult<Option<Role>> {
    let row = sqlx::query("SELECT id, name FROM roles WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(|r| Role {
        id: r.get("id"),
        name: r.get("name"),
    }))
}

pub async fn insert_role(conn: &mut SqliteConnection, name: &str) -> AppResult<Role> {
    let result = sqlx::query("INSERT INTO roles (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(|err| AppError::from_insert(err, "role already exists"))?;

    Ok(Role {
        id: result.last_insert_rowid(),
        name: name.to_string(),
    })
}

pub async fn insert_right(conn: &mut SqliteConnection, spec: RightSpec) -> AppResult<Right> {
    let result = sqlx::query("INSERT INTO rights (read, write, only_own, model) VALUES (?, ?, ?, ?)")
        .bind(spec.read)
        .bind(spec.write)
        .bind(spec.only_own)
        .bind(spec.model.as_str())
        .execute(&mut *conn)
        .await
        .map_err(|err| AppError::from_insert(err, "right already exists"))?;

    Ok(Right {
        id: result.last_insert_rowid(),
        spec,
    })
}

/// Returns the existing right with these flags, creating it when absent.
pub async fn ensure_right(conn: &mut SqliteConnection, spec: RightSpec) -> AppResult<Right> {
    let existing = sqlx::query_as::<_, RightRow>(
        "SELECT id, read, write, only_own, model FROM rights WHERE read = ? AND write = ? AND only_own = ? AND model = ?",
    )
    .bind(spec.read)
    .bind(spec.write)
    .bind(spec.only_own)
    .bind(spec.model.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    match existing {
        Some(row) => row.try_into(),
        None => insert_right(conn, spec).await,
    }
}

pub async fn grant_right(conn: &mut SqliteConnection, role_id: i64, right_id: i64) -> AppResult<()> {
    sqlx::query("INSERT INTO role_rights (role_id, right_id) VALUES (?, ?)")
        .bind(role_id)
        .bind(right_id)
        .execute(&mut *conn)
        .await
        .map_err(|err| AppError::from_insert(err, "right already granted to role"))?;

    Ok(())
}

pub async fn assign_role(conn: &mut SqliteConnection, user_id: i64, role_id: i64) -> AppResult<()> {
    sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(role_id)
        .execute(&mut *conn)
        .await
        .map_err(|err| AppError::from_insert(err, "role already assigned to user"))?;

    Ok(())
}

pub async fn rights_for_role(conn: &mut SqliteConnection, role_id: i64) -> AppResult<Vec<Right>> {
    let rows = sqlx::query_as::<_, RightRow>(
        "SELECT rt.id, rt.read, rt.write, rt.only_own, rt.model \
         FROM role_rights rr JOIN rights rt ON rt.id = rr.right_id \
         WHERE rr.role_id = ? ORDER BY rt.id",
    )
    .bind(role_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Right::try_from).collect()
}

/// Loads every role held by `user_id` together with that role's rights.
pub async fn load_role_grants(conn: &mut SqliteConnection, user_id: i64) -> AppResult<Vec<RoleGrant>> {
    let rows = sqlx::query(
        "SELECT r.id AS role_id, r.name AS role_name, \
                rt.id AS right_id, rt.read, rt.write, rt.only_own, rt.model \
         FROM user_roles ur \
         JOIN roles r ON r.id = ur.role_id \
         LEFT JOIN role_rights rr ON rr.role_id = r.id \
         LEFT JOIN rights rt ON rt.id = rr.right_id \
         WHERE ur.user_id = ? \
         ORDER BY r.id, rt.id",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut grants: BTreeMap<i64, RoleGrant> = BTreeMap::new();
    for row in &rows {
        let role_id: i64 = row.try_get("role_id")?;
        let grant = grants.entry(role_id).or_insert_with(|| RoleGrant {
            role: Role {
                id: role_id,
                name: row.get("role_name"),
            },
            rights: Vec::new(),
        });

        if let Some(right) = right_from_joined_row(row)? {
            grant.rights.push(right);
        }
    }

    Ok(grants.into_values().collect())
}

fn right_from_joined_row(row: &SqliteRow) -> AppResult<Option<Right>> {
    let Some(id) = row.try_get::<Option<i64>, _>("right_id")? else {
        return Ok(None);
    };
    let model: String = row.try_get("model")?;

    Ok(Some(Right {
        id,
        spec: RightSpec {
            read: row.try_get("read")?,
            write: row.try_get("write")?,
            only_own: row.try_get("only_own")?,
            model: model.parse::<ModelName>()?,
        },
    }))
}

/// Counts the distinct rights reachable from `user_id` through its roles that
/// permit `action` on `model`. Own-only rights only count when the acting user
/// owns the target.
pub async fn count_matching_rights(
    conn: &mut SqliteConnection,
    user_id: i64,
    model: ModelName,
    action: Action,
    acting_is_owner: bool,
) -> AppResult<i64> {
    let action_column = match action {
        Action::Read => "rt.read",
        Action::Write => "rt.write",
    };

    let sql = format!(
        "SELECT COUNT(DISTINCT rt.id) \
         FROM user_roles ur \
         JOIN role_rights rr ON rr.role_id = ur.role_id \
         JOIN rights rt ON rt.id = rr.right_id \
         WHERE ur.user_id = ? AND rt.model = ? AND {} = 1 AND (? OR rt.only_own = 0)",
        action_column
    );

    let count: i64 = sqlx::query_scalar(&sql)
        .bind(user_id)
        .bind(model.as_str())
        .bind(acting_is_owner)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}
