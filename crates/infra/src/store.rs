use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use orgadmin_core::{DomainError, DomainResult, Entity};

/// Keyed record store for one entity type.
///
/// Stores do not enforce business rules (uniqueness, ownership); the resource
/// services do that before writing.
pub trait EntityStore<E: Entity>: Send + Sync {
    fn get(&self, id: &E::Id) -> DomainResult<Option<E>>;
    fn upsert(&self, entity: E) -> DomainResult<()>;
    fn remove(&self, id: &E::Id) -> DomainResult<Option<E>>;
    fn list(&self) -> DomainResult<Vec<E>>;
}

impl<E, S> EntityStore<E> for Arc<S>
where
    E: Entity,
    S: EntityStore<E> + ?Sized,
{
    fn get(&self, id: &E::Id) -> DomainResult<Option<E>> {
        (**self).get(id)
    }

    fn upsert(&self, entity: E) -> DomainResult<()> {
        (**self).upsert(entity)
    }

    fn remove(&self, id: &E::Id) -> DomainResult<Option<E>> {
        (**self).remove(id)
    }

    fn list(&self) -> DomainResult<Vec<E>> {
        (**self).list()
    }
}

/// In-memory store for tests/dev. Not optimized for performance.
#[derive(Debug)]
pub struct InMemoryStore<E: Entity> {
    inner: RwLock<HashMap<E::Id, E>>,
}

impl<E: Entity> InMemoryStore<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<E: Entity> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> DomainError {
    DomainError::storage("lock poisoned")
}

/// Write lock shared by every service that touches the same records.
///
/// Users and companies reference each other (membership, detachment on
/// delete), so both services must serialize their read-check-write sequences
/// behind one guard.
#[derive(Debug, Clone, Default)]
pub struct WriteLock(Arc<Mutex<()>>);

impl WriteLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> DomainResult<MutexGuard<'_, ()>> {
        self.0.lock().map_err(|_| poisoned())
    }
}

impl<E> EntityStore<E> for InMemoryStore<E>
where
    E: Entity + Clone + Send + Sync,
    E::Id: Send + Sync,
{
    fn get(&self, id: &E::Id) -> DomainResult<Option<E>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(id).cloned())
    }

    fn upsert(&self, entity: E) -> DomainResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(*entity.id(), entity);
        Ok(())
    }

    fn remove(&self, id: &E::Id) -> DomainResult<Option<E>> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(id))
    }

    fn list(&self) -> DomainResult<Vec<E>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }
}
