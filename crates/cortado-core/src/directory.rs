use std::sync::Arc;

use uuid::Uuid;

use cortado_store::Store;
use cortado_types::api::ProfileQuery;
use cortado_types::models::UserProfile;

use crate::error::AppError;

#[derive(Debug, Clone, Default)]
pub struct DirectoryFilter {
    /// Exact industry match, delegated to the store.
    pub industry: Option<String>,
    /// Free-text needle over name, title and company. The store contract has
    /// no text operator, so this is applied after the fetch.
    pub search: Option<String>,
}

/// Profile directory screen: browse everyone else, filtered and ordered by
/// most recent profile update.
#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<dyn Store>,
    user_id: Uuid,
}

impl DirectoryService {
    pub(crate) fn new(store: Arc<dyn Store>, user_id: Uuid) -> Self {
        Self { store, user_id }
    }

    pub async fn browse(&self, filter: DirectoryFilter) -> Result<Vec<UserProfile>, AppError> {
        let profiles = self
            .store
            .list_profiles(ProfileQuery {
                exclude: Some(self.user_id),
                industry: filter.industry,
            })
            .await?;

        let Some(needle) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return Ok(profiles);
        };
        let needle = needle.to_lowercase();

        Ok(profiles
            .into_iter()
            .filter(|p| {
                p.full_name.to_lowercase().contains(&needle)
                    || p.title
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(&needle))
                    || p.company
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&needle))
            })
            .collect())
    }

    pub async fn profile(&self, id: Uuid) -> Result<Option<UserProfile>, AppError> {
        Ok(self.store.profile(id).await?)
    }
}
