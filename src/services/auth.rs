use crate::{
    error::{AppError, AppResult},
    forms::auth::CleanSignup,
    models::UserModel,
    services::user::UserService,
    utils::{encode_session_token, hash_password, verify_password},
};
use sea_orm::DatabaseConnection;

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new user.
    /// Returns (user_model, session_token).
    pub async fn register(&self, signup: &CleanSignup) -> AppResult<(UserModel, String)> {
        let users = UserService::new(self.db.clone());
        if users.username_taken(&signup.username).await? {
            return Err(AppError::Conflict(USERNAME_TAKEN.to_string()));
        }

        let password_hash = hash_password(&signup.password)?;
        let user = users
            .create(&signup.username, &signup.email, &password_hash, "user")
            .await?;
        let token = encode_session_token(user.id)?;

        Ok((user, token))
    }

    /// Check credentials.
    /// Returns (user_model, session_token).
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(UserModel, String)> {
        let user = UserService::new(self.db.clone())
            .get_by_username(username)
            .await
            .map_err(|e| match e {
                AppError::NotFound => AppError::Unauthorized,
                other => other,
            })?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!("Wrong password for '{}'", username);
            return Err(AppError::Unauthorized);
        }

        let token = encode_session_token(user.id)?;
        Ok((user, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn signup() -> CleanSignup {
        CleanSignup {
            username: "leo".to_string(),
            email: "leo@example.com".to_string(),
            password: "war-and-peace".to_string(),
        }
    }

    #[tokio::test]
    async fn taken_username_conflicts() {
        let existing = UserModel {
            id: 1,
            username: "leo".to_string(),
            email: "other@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: "user".to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing]])
            .into_connection();

        let err = AuthService::new(db).register(&signup()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == USERNAME_TAKEN));
    }

    #[tokio::test]
    async fn unknown_user_cannot_login() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<UserModel>::new()])
            .into_connection();

        let err = AuthService::new(db).login("ghost", "whatever1").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }
}
