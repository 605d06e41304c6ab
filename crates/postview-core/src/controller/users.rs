// ── Users controller ──
//
// Loads the author list for the filter selector. Goes straight to the
// network: the user list is small and is fetched once per session.

use std::sync::Arc;

use tracing::{debug, error};

use crate::config::FeedConfig;
use crate::error::CoreError;
use crate::fetch::CachedFetcher;
use crate::model::User;
use crate::state::State;

/// Handle to the users list. Cheaply cloneable.
#[derive(Clone)]
pub struct UsersController {
    inner: Arc<UsersInner>,
}

struct UsersInner {
    config: FeedConfig,
    fetcher: Arc<CachedFetcher>,
    users: State<Vec<User>>,
    loading: State<bool>,
    error: State<Option<String>>,
}

impl UsersController {
    pub fn new(config: FeedConfig, fetcher: Arc<CachedFetcher>) -> Self {
        Self {
            inner: Arc::new(UsersInner {
                config,
                fetcher,
                users: State::new(Vec::new()),
                loading: State::new(false),
                error: State::new(None),
            }),
        }
    }

    /// Fetch the first `users_limit` users into the `users` store.
    ///
    /// On failure the store is emptied and the error is both recorded in
    /// the `error` store and returned.
    pub async fn load(&self) -> Result<(), CoreError> {
        let inner = &self.inner;
        inner.loading.set(true);

        let result = inner
            .fetcher
            .client()
            .list::<User>(&inner.config.users_endpoint, &inner.config.users_query())
            .await;

        let outcome = match result {
            Ok(page) => {
                debug!(count = page.items.len(), "users loaded");
                if inner.error.with(Option::is_some) {
                    inner.error.set(None);
                }
                inner.users.set(page.items);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "could not fetch users");
                inner.error.set(Some(e.to_string()));
                inner.users.set(Vec::new());
                Err(CoreError::from(e))
            }
        };

        inner.loading.set(false);
        outcome
    }

    pub fn users(&self) -> &State<Vec<User>> {
        &self.inner.users
    }

    pub fn loading(&self) -> &State<bool> {
        &self.inner.loading
    }

    pub fn error(&self) -> &State<Option<String>> {
        &self.inner.error
    }
}
