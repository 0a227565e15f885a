use crate::db_storage::PersonStore;
use crate::errors::AppError;
use crate::models::{NewPerson, Page, Person, PersonFilter};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// In-process store with the same semantics as `PgPersonStore`.
///
/// Ids start at 1 and are never reused, even after deletes.
#[derive(Default)]
pub struct MemoryPersonStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    last_id: i64,
    people: BTreeMap<i64, Person>,
}

impl MemoryPersonStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.people.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PersonStore for MemoryPersonStore {
    async fn create(&self, person: NewPerson) -> Result<Person, AppError> {
        let mut inner = self.inner.lock().await;
        inner.last_id += 1;
        let stored = person.with_id(inner.last_id);
        inner.people.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: i64) -> Result<Person, AppError> {
        self.inner
            .lock()
            .await
            .people
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::person_not_found(id))
    }

    async fn list(&self, filter: &PersonFilter, page: Page) -> Result<Vec<Person>, AppError> {
        let offset = usize::try_from(page.offset).unwrap_or(0);
        let limit = usize::try_from(page.limit).unwrap_or(0);

        let inner = self.inner.lock().await;
        Ok(inner
            .people
            .values()
            .filter(|p| filter.matches(p))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, mut person: Person) -> Result<Person, AppError> {
        let mut inner = self.inner.lock().await;
        let slot = inner
            .people
            .get_mut(&id)
            .ok_or_else(|| AppError::person_not_found(id))?;
        person.id = id;
        *slot = person.clone();
        Ok(person)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.inner
            .lock()
            .await
            .people
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::person_not_found(id))
    }
}
