use crate::error::{RepoLikesError, Result};
use crate::types::{RemoteRepository, RepositoryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// A repository as shown to the user, with the session-local liked flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,
    pub title: String,
    pub url: String,
    pub techs: Vec<String>,
    pub likes: u64,
    pub liked: bool,
}

impl From<RemoteRepository> for Repository {
    fn from(remote: RemoteRepository) -> Self {
        Self {
            id: remote.id,
            title: remote.title,
            url: remote.url,
            techs: remote.techs,
            likes: remote.likes,
            liked: false,
        }
    }
}

impl Repository {
    pub fn likes_label(&self) -> String {
        likes_label(self.likes)
    }
}

/// Like count with its noun: singular up to one, plural above.
pub fn likes_label(count: u64) -> String {
    if count > 1 {
        format!("{} likes", count)
    } else {
        format!("{} like", count)
    }
}

/// Immutable, ordered snapshot of the repositories on screen.
///
/// Updates never touch a snapshot that has been handed out; they build a new
/// one. Equality compares contents, [`RepositoryList::same_snapshot`] compares
/// container identity.
#[derive(Debug, Clone, Default)]
pub struct RepositoryList {
    items: Arc<Vec<Repository>>,
}

impl PartialEq for RepositoryList {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for RepositoryList {}

impl RepositoryList {
    /// Build a fresh list from a service response. Every entry starts unliked;
    /// repeated ids after the first are dropped.
    pub fn from_remote(records: Vec<RemoteRepository>) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let items = records
            .into_iter()
            .filter(|record| {
                let fresh = seen.insert(record.id.clone());
                if !fresh {
                    warn!(id = %record.id, "Dropping repository with duplicate id");
                }
                fresh
            })
            .map(Repository::from)
            .collect();

        Self { items: Arc::new(items) }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Repository] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Repository> {
        self.items.iter()
    }

    pub fn get(&self, id: &RepositoryId) -> Option<&Repository> {
        self.items.iter().find(|repo| &repo.id == id)
    }

    pub fn contains(&self, id: &RepositoryId) -> bool {
        self.get(id).is_some()
    }

    /// New snapshot in which `id` is marked liked and carries the higher of its
    /// current count and `likes`. The target is looked up in this snapshot, not
    /// by a position remembered from an earlier one.
    pub fn with_like(&self, id: &RepositoryId, likes: u64) -> Result<(Self, Repository)> {
        let index = self
            .items
            .iter()
            .position(|repo| &repo.id == id)
            .ok_or_else(|| RepoLikesError::NotFound(format!("repository {}", id)))?;

        let mut items = self.items.as_ref().clone();
        let entry = &mut items[index];
        if likes < entry.likes {
            warn!(%id, current = entry.likes, likes, "Ignoring stale like count");
        }
        // Counts never go down locally; an older response can land after a newer one
        entry.likes = entry.likes.max(likes);
        entry.liked = true;
        let updated = entry.clone();

        Ok((Self { items: Arc::new(items) }, updated))
    }

    /// Same contents in a new container, for forcing a redraw.
    pub fn republish(&self) -> Self {
        Self {
            items: Arc::new(self.items.as_ref().clone()),
        }
    }

    pub fn same_snapshot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl<'a> IntoIterator for &'a RepositoryList {
    type Item = &'a Repository;
    type IntoIter = std::slice::Iter<'a, Repository>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Counters for a list controller session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStats {
    pub loads_completed: u64,
    pub loads_failed: u64,
    pub likes_applied: u64,
    pub likes_failed: u64,
    /// Likes whose target was gone from the list by the time the response came back
    pub likes_discarded: u64,
    pub likes_in_flight: usize,
    pub repository_count: usize,
    pub last_loaded_at: Option<DateTime<Utc>>,
}

/// Owner shown in the screen header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub nick: String,
}
