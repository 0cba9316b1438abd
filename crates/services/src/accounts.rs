//! Registration, login, token resolution and profiles.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domains::{
    Actor, DomainError, FollowRepo, PasswordHasher, ProfilePatch, PublicProfile, Result,
    TokenService, User, UserRepo,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::validate;

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// A user together with a freshly issued bearer token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct AccountService {
    users: Arc<dyn UserRepo>,
    follows: Arc<dyn FollowRepo>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        follows: Arc<dyn FollowRepo>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            follows,
            hasher,
            tokens,
        }
    }

    pub async fn register(&self, reg: Registration) -> Result<AuthSession> {
        let username = validate::username(&reg.username)?;
        let email = validate::email(&reg.email)?;
        validate::password(&reg.password)?;
        let display_name = validate::optional("display_name", reg.display_name, 64)?
            .unwrap_or_else(|| username.clone());

        if self.users.find_by_login(&username).await?.is_some() {
            return Err(DomainError::conflict("username is already taken"));
        }
        if self.users.find_by_login(&email).await?.is_some() {
            return Err(DomainError::conflict("email is already registered"));
        }

        let hash = self.hasher.hash(&reg.password)?;
        let user = self
            .users
            .insert(User::new(username, email, hash, display_name))
            .await?;
        info!(user_id = %user.id, username = %user.username, "user registered");
        self.session(user)
    }

    /// `identifier` is a username or an email address.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthSession> {
        let invalid = || DomainError::Unauthorized("invalid credentials".into());

        let user = self
            .users
            .find_by_login(identifier.trim())
            .await?
            .ok_or_else(invalid)?;
        if !self.hasher.verify(password, &user.password_hash)? {
            warn!(user_id = %user.id, "failed login attempt");
            return Err(invalid());
        }
        if user.is_banned {
            return Err(DomainError::forbidden("account is banned"));
        }
        info!(user_id = %user.id, "user logged in");
        self.session(user)
    }

    /// Verifies a bearer token and re-reads the account so bans and role
    /// changes apply to tokens issued before them.
    pub async fn resolve(&self, token: &str) -> Result<Actor> {
        let claimed = self.tokens.verify(token)?;
        let user = self
            .users
            .find_by_id(claimed.id)
            .await?
            .ok_or_else(|| DomainError::Unauthorized("account no longer exists".into()))?;
        if user.is_banned {
            return Err(DomainError::forbidden("account is banned"));
        }
        Ok(Actor::new(user.id, user.role))
    }

    pub async fn me(&self, actor: Actor) -> Result<User> {
        self.users
            .find_by_id(actor.id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", actor.id))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<PublicProfile> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))?;
        let (followers, following) = self.follows.counts(user_id).await?;
        Ok(PublicProfile {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            bio: user.bio,
            followers,
            following,
            created_at: user.created_at,
        })
    }

    pub async fn update_profile(&self, actor: Actor, patch: ProfilePatch) -> Result<User> {
        let mut user = self.me(actor).await?;
        if let Some(name) = patch.display_name {
            user.display_name = validate::required("display_name", &name, 64)?;
        }
        if let Some(avatar) = patch.avatar_url {
            user.avatar_url = validate::optional("avatar_url", Some(avatar), 2048)?;
        }
        if let Some(bio) = patch.bio {
            user.bio = validate::optional("bio", Some(bio), 500)?;
        }
        user.updated_at = Utc::now();
        self.users.update(user).await
    }

    fn session(&self, user: User) -> Result<AuthSession> {
        let issued = self.tokens.issue(&user)?;
        Ok(AuthSession {
            user,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }
}
