use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use domains::{DomainError, PageRequest, Paged, Result, User, UserRepo};
use uuid::Uuid;

use super::{page_of, MemoryStore};

fn username_key(username: &str) -> String {
    format!("u:{}", username.to_lowercase())
}

fn email_key(email: &str) -> String {
    format!("e:{}", email.to_lowercase())
}

impl MemoryStore {
    /// Claims a login key for `id`, failing if someone else holds it.
    fn claim(&self, key: String, id: Uuid, what: &str) -> Result<()> {
        match self.logins.entry(key) {
            Entry::Occupied(_) => Err(DomainError::conflict(format!("{what} is already taken"))),
            Entry::Vacant(slot) => {
                slot.insert(id);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert(&self, user: User) -> Result<User> {
        let uname = username_key(&user.username);
        self.claim(uname.clone(), user.id, "username")?;
        if let Err(e) = self.claim(email_key(&user.email), user.id, "email") {
            self.logins.remove(&uname);
            return Err(e);
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_login(&self, identifier: &str) -> Result<Option<User>> {
        let key = if identifier.contains('@') {
            email_key(identifier)
        } else {
            username_key(identifier)
        };
        let id = match self.logins.get(&key) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.find_by_id(id).await
    }

    async fn update(&self, user: User) -> Result<User> {
        match self.users.get_mut(&user.id) {
            Some(mut slot) => {
                *slot = user.clone();
                Ok(user)
            }
            None => Err(DomainError::not_found("user", user.id)),
        }
    }

    async fn list(&self, page: PageRequest) -> Result<Paged<User>> {
        Ok(page_of(&self.users, page, |_| true, |a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
        }))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.users.len() as u64)
    }
}
