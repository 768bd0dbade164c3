//! User repository: the directory that import resolves references against.

use rv_core::entities::User;
use rv_core::ids::PREFIX_USER;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime};
use crate::service::VaultService;

const USER_COLUMNS: &str = "id, username, email, phone, mobile, title_before, first_name, \
                            middle_name, last_name, title_after, created_at";

fn row_to_user(row: &libsql::Row) -> Result<User, DatabaseError> {
    Ok(User {
        id: row.get::<String>(0)?,
        username: row.get::<String>(1)?,
        email: get_opt_string(row, 2)?,
        phone: get_opt_string(row, 3)?,
        mobile: get_opt_string(row, 4)?,
        title_before: get_opt_string(row, 5)?,
        first_name: get_opt_string(row, 6)?,
        middle_name: get_opt_string(row, 7)?,
        last_name: get_opt_string(row, 8)?,
        title_after: get_opt_string(row, 9)?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
    })
}

/// Profile of a user to create.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub title_before: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub title_after: Option<String>,
}

impl NewUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    #[must_use]
    pub fn titles(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.title_before = Some(before.into());
        self.title_after = Some(after.into());
        self
    }
}

impl VaultService {
    pub async fn create_user(&self, new: NewUser) -> Result<User, DatabaseError> {
        let id = self.db().generate_id(PREFIX_USER).await?;
        let now = self.now();

        self.db()
            .execute(
                &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
                libsql::params![
                    id.as_str(),
                    new.username.as_str(),
                    new.email.as_deref(),
                    new.phone.as_deref(),
                    new.mobile.as_deref(),
                    new.title_before.as_deref(),
                    new.first_name.as_deref(),
                    new.middle_name.as_deref(),
                    new.last_name.as_deref(),
                    new.title_after.as_deref(),
                    now.to_rfc3339(),
                ],
            )
            .await?;

        Ok(User {
            id,
            username: new.username,
            email: new.email,
            phone: new.phone,
            mobile: new.mobile,
            title_before: new.title_before,
            first_name: new.first_name,
            middle_name: new.middle_name,
            last_name: new.last_name,
            title_after: new.title_after,
            created_at: now,
        })
    }

    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        let mut rows = self
            .db()
            .query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("user", id))?;
        row_to_user(&row)
    }

    /// Resolve a user by id, falling back to email.
    ///
    /// Returns `None` when neither matches a user of this installation.
    pub async fn find_user(
        &self,
        id: &str,
        email: Option<&str>,
    ) -> Result<Option<User>, DatabaseError> {
        let mut rows = self
            .db()
            .query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"), [id])
            .await?;
        if let Some(row) = rows.next().await? {
            return Ok(Some(row_to_user(&row)?));
        }

        let Some(email) = email.filter(|e| !e.is_empty()) else {
            return Ok(None);
        };
        let mut rows = self
            .db()
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 ORDER BY created_at LIMIT 1"),
                [email],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let mut rows = self
            .db()
            .query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"), ())
            .await?;
        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }

    /// Delete a user.
    ///
    /// Memberships and locks go with the user; section and finding assignees
    /// are cleared.
    pub async fn delete_user(&self, id: &str) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .execute("DELETE FROM users WHERE id = ?1", [id])
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("user", id));
        }
        tracing::info!(user = %id, "deleted user");
        Ok(())
    }
}
