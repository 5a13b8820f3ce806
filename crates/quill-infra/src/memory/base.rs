use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::error::RepoError;
use quill_core::ports::BaseRepository;

/// An entity that can live in an [`InMemoryRepository`].
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;

    /// Values that must be unique across the table, labelled by column.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Carry over columns an update must not overwrite from `stored`.
    fn keep_on_update(&mut self, _stored: &Self) {}
}

/// Generic in-memory table keyed by id, enforcing `Record::unique_keys`.
///
/// Data is lost on process restart.
pub struct InMemoryRepository<T: Record> {
    pub(crate) rows: RwLock<HashMap<Uuid, T>>,
}

impl<T: Record> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Record> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.rows.read().await.len()
    }

    fn check_unique(rows: &HashMap<Uuid, T>, entity: &T) -> Result<(), RepoError> {
        for (column, value) in entity.unique_keys() {
            let clash = rows.values().any(|other| {
                other.id() != entity.id()
                    && other
                        .unique_keys()
                        .iter()
                        .any(|(c, v)| *c == column && *v == value)
            });
            if clash {
                return Err(RepoError::Constraint(format!(
                    "duplicate value for {column}"
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Record> BaseRepository<T, Uuid> for InMemoryRepository<T> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn create(&self, entity: T) -> Result<T, RepoError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&entity.id()) {
            return Err(RepoError::Constraint("duplicate primary key".to_string()));
        }
        Self::check_unique(&rows, &entity)?;
        rows.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn update(&self, mut entity: T) -> Result<T, RepoError> {
        let mut rows = self.rows.write().await;
        let stored = rows.get(&entity.id()).ok_or(RepoError::NotFound)?;
        entity.keep_on_update(stored);
        Self::check_unique(&rows, &entity)?;
        rows.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.rows.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}
