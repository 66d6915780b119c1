use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::{User, UserCreate, UserFilter, UserPatch};
use crate::repository::UserRepository;
use crate::user_actor::UserError;

/// Client for interacting with the User actor.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<User>,
}

crate::impl_basic_client!(UserClient, User, UserError, user);

impl UserClient {
    async fn find_one(&self, filter: UserFilter, key: &str) -> Result<User, UserError> {
        self.inner
            .list(filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| UserError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl UserRepository for UserClient {
    #[instrument(skip(self, params), fields(username = %params.username))]
    async fn create(&self, params: UserCreate) -> Result<String, UserError> {
        debug!("Sending request");
        self.inner.create(params).await
    }

    async fn get(&self, id: &str) -> Result<User, UserError> {
        self.fetch_user(id).await
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<User, UserError> {
        debug!("Sending request");
        let filter = UserFilter {
            username: Some(username.to_string()),
            ..Default::default()
        };
        self.find_one(filter, username).await
    }

    // Email is skipped from the span; it is personal data
    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<User, UserError> {
        debug!("Sending request");
        let filter = UserFilter {
            email: Some(email.to_string()),
            ..Default::default()
        };
        self.find_one(filter, email).await
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: &str, patch: UserPatch) -> Result<User, UserError> {
        debug!("Sending request");
        self.inner.update(id.to_string(), patch).await
    }

    async fn delete(&self, id: &str) -> Result<(), UserError> {
        self.delete_user(id).await
    }
}
