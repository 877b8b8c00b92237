//! User repository for database operations.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};

use rentflow_core::access::{Actor, Role};
use rentflow_shared::types::UserId;

use crate::entities::users;

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a user with a caller-chosen id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_with_id(
        &self,
        id: UserId,
        email: &str,
        full_name: &str,
        role: Role,
    ) -> Result<users::Model, DbErr> {
        let now = Utc::now().into();
        users::ActiveModel {
            id: Set(id.into()),
            email: Set(email.trim().to_ascii_lowercase()),
            full_name: Set(full_name.trim().to_string()),
            role: Set(role.into()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Finds a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }

    /// Resolves the acting user with their current role.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_actor(&self, id: UserId) -> Result<Option<Actor>, DbErr> {
        Ok(self
            .find_by_id(id)
            .await?
            .map(|user| Actor::new(id, user.role.into())))
    }
}
