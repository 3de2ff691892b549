//! User reads and writes: read-through on lookups, invalidate on mutation.

use tracing::info;
use uuid::Uuid;

use crate::domain::UserRecord;
use crate::infra::{ItemKey, from_document, to_document};

use super::{DataService, ServiceError};

const EMAIL_INDEX: &str = "email-index";

impl DataService {
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<UserRecord>, ServiceError> {
        if let Some(user) = self.cache().get_user_by_id(id) {
            return Ok(Some(user));
        }
        let doc = self
            .store()
            .get_item(&self.tables().users, &ItemKey::hash(id))
            .await?;
        let Some(doc) = doc else {
            return Ok(None);
        };
        let user: UserRecord = from_document(doc)?;
        self.cache().set_user_by_id(user.clone());
        Ok(Some(user))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, ServiceError> {
        if let Some(user) = self.cache().get_user_by_email(email) {
            return Ok(Some(user));
        }
        let docs = self
            .store()
            .query_index(&self.tables().users, EMAIL_INDEX, email, false, Some(1))
            .await?;
        let Some(doc) = docs.into_iter().next() else {
            return Ok(None);
        };
        let user: UserRecord = from_document(doc)?;
        self.cache().set_user_by_email(user.clone());
        Ok(Some(user))
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, ServiceError> {
        if let Some(users) = self.cache().get_all_users() {
            return Ok(users);
        }
        let mut users = Vec::new();
        let mut token = None;
        loop {
            let page = self
                .store()
                .scan(&self.tables().users, &[], token, None)
                .await?;
            for doc in page.items {
                users.push(from_document::<UserRecord>(doc)?);
            }
            token = page.next;
            if token.is_none() {
                break;
            }
        }
        if !users.is_empty() {
            self.cache().set_all_users(users.clone());
        }
        Ok(users)
    }

    /// Persist a new user under a freshly assigned id, then drop every cache
    /// entry the write can affect.
    pub async fn create_user(&self, mut user: UserRecord) -> Result<UserRecord, ServiceError> {
        user.id = Uuid::new_v4().to_string();
        self.store()
            .put_item(&self.tables().users, to_document(&user)?)
            .await?;
        self.cache().invalidate_user(&user.id, Some(&user.email));
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub async fn update_user(&self, user: &UserRecord) -> Result<(), ServiceError> {
        self.store()
            .put_item(&self.tables().users, to_document(user)?)
            .await?;
        self.cache().invalidate_user(&user.id, Some(&user.email));
        info!(user_id = %user.id, "user updated");
        Ok(())
    }

    /// Delete a user by id. The email-keyed cache entry is only dropped when
    /// the caller still knows the email.
    pub async fn delete_user(&self, id: &str, email: Option<&str>) -> Result<(), ServiceError> {
        self.store()
            .delete_item(&self.tables().users, &ItemKey::hash(id))
            .await?;
        self.cache().invalidate_user(id, email);
        info!(user_id = %id, "user deleted");
        Ok(())
    }
}
