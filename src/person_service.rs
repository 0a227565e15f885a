use crate::db_storage::PersonStore;
use crate::enrichment::NameEnricher;
use crate::errors::AppError;
use crate::models::{
    non_empty, ListParams, NewPerson, Page, Person, PersonCreate, PersonFilter, PersonUpdate,
    DEFAULT_LIMIT, DEFAULT_OFFSET,
};
use std::sync::Arc;

/// Orchestrates person operations over a store and the name enricher.
#[derive(Clone)]
pub struct PersonService {
    store: Arc<dyn PersonStore>,
    enricher: NameEnricher,
}

impl PersonService {
    pub fn new(store: Arc<dyn PersonStore>, enricher: NameEnricher) -> Self {
        Self { store, enricher }
    }

    /// Validate, enrich, then persist a new person.
    ///
    /// Enrichment never fails the call; unconfident or failed lookups just
    /// leave `gender`/`nationality` unset.
    pub async fn create_person(&self, input: PersonCreate) -> Result<Person, AppError> {
        let name = required("name", input.name)?;
        let surname = required("surname", input.surname)?;

        let mut person = NewPerson {
            name,
            surname,
            patronymic: non_empty(input.patronymic),
            ..Default::default()
        };

        let enrichment = self.enricher.enrich(&person.name).await;
        enrichment.apply_to(&mut person);

        tracing::info!("Creating person: {} {}", person.name, person.surname);
        let stored = self.store.create(person).await?;
        tracing::info!("Created person id: {}", stored.id);

        Ok(stored)
    }

    pub async fn list_people(
        &self,
        filter: &PersonFilter,
        page: Page,
    ) -> Result<Vec<Person>, AppError> {
        let people = self.store.list(filter, page).await?;
        tracing::info!("Listed {} people", people.len());
        Ok(people)
    }

    pub async fn get_person(&self, id: i64) -> Result<Person, AppError> {
        self.store.get(id).await
    }

    /// Merge-patch: only fields present in `update` change.
    pub async fn update_person(&self, id: i64, update: PersonUpdate) -> Result<Person, AppError> {
        let mut person = self.store.get(id).await?;

        if update.is_empty() {
            tracing::debug!("Empty update for person id: {}", id);
            return Ok(person);
        }

        update.apply_to(&mut person);
        validate(&person)?;

        let updated = self.store.update(id, person).await?;
        tracing::info!("Updated person id: {}", id);
        Ok(updated)
    }

    pub async fn delete_person(&self, id: i64) -> Result<(), AppError> {
        self.store.delete(id).await?;
        tracing::info!("Deleted person id: {}", id);
        Ok(())
    }
}

fn required(field: &str, value: String) -> Result<String, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(value)
}

fn validate(person: &Person) -> Result<(), AppError> {
    required("name", person.name.clone())?;
    required("surname", person.surname.clone())?;
    if matches!(person.age, Some(age) if age < 0) {
        return Err(AppError::Validation("age must not be negative".to_string()));
    }
    Ok(())
}

/// Turn raw query parameters into a filter and page.
///
/// Empty values are treated as absent; unparsable or negative numbers are
/// validation errors.
pub fn parse_list_params(params: ListParams) -> Result<(PersonFilter, Page), AppError> {
    let filter = PersonFilter {
        name: non_empty(params.name),
        surname: non_empty(params.surname),
        age: parse_number("age", params.age)?,
        gender: non_empty(params.gender),
        nationality: non_empty(params.nationality),
    };

    let page = Page {
        offset: parse_number("skip", params.skip)?.unwrap_or(DEFAULT_OFFSET),
        limit: parse_number("limit", params.limit)?.unwrap_or(DEFAULT_LIMIT),
    };
    if page.offset < 0 || page.limit < 0 {
        return Err(AppError::Validation(
            "skip and limit must not be negative".to_string(),
        ));
    }

    Ok((filter, page))
}

fn parse_number<T: std::str::FromStr>(
    field: &str,
    raw: Option<String>,
) -> Result<Option<T>, AppError> {
    match non_empty(raw) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{} must be an integer", field))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_storage::MemoryPersonStore;

    fn service() -> (PersonService, Arc<MemoryPersonStore>) {
        let store = Arc::new(MemoryPersonStore::new());
        (
            PersonService::new(store.clone(), NameEnricher::disabled()),
            store,
        )
    }

    fn create(name: &str, surname: &str) -> PersonCreate {
        PersonCreate {
            name: name.into(),
            surname: surname.into(),
            patronymic: None,
        }
    }

    #[tokio::test]
    async fn test_blank_name_persists_nothing() {
        let (service, store) = service();
        let result = service.create_person(create("   ", "Ушаков")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_patronymic_is_unset() {
        let (service, _) = service();
        let mut input = create("Дмитрий", "Ушаков");
        input.patronymic = Some(String::new());
        let person = service.create_person(input).await.unwrap();
        assert_eq!(person.patronymic, None);
    }

    #[tokio::test]
    async fn test_update_rejects_clearing_surname() {
        let (service, _) = service();
        let person = service
            .create_person(create("Дмитрий", "Ушаков"))
            .await
            .unwrap();

        let update = PersonUpdate {
            surname: Some(None),
            ..Default::default()
        };
        let result = service.update_person(person.id, update).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let stored = service.get_person(person.id).await.unwrap();
        assert_eq!(stored.surname, "Ушаков");
    }

    #[tokio::test]
    async fn test_update_rejects_negative_age() {
        let (service, _) = service();
        let person = service
            .create_person(create("Дмитрий", "Ушаков"))
            .await
            .unwrap();

        let update = PersonUpdate {
            age: Some(Some(-1)),
            ..Default::default()
        };
        let result = service.update_person(person.id, update).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_list_params_defaults() {
        let (filter, page) = parse_list_params(ListParams::default()).unwrap();
        assert_eq!(filter, PersonFilter::default());
        assert_eq!(page, Page { offset: 0, limit: 10 });
    }

    #[test]
    fn test_list_params_empty_values_are_absent() {
        let params = ListParams {
            name: Some(String::new()),
            age: Some(String::new()),
            limit: Some("25".into()),
            ..Default::default()
        };
        let (filter, page) = parse_list_params(params).unwrap();
        assert_eq!(filter.name, None);
        assert_eq!(filter.age, None);
        assert_eq!(page.limit, 25);
    }

    #[test]
    fn test_list_params_reject_bad_numbers() {
        let params = ListParams {
            age: Some("old".into()),
            ..Default::default()
        };
        assert!(matches!(
            parse_list_params(params),
            Err(AppError::Validation(_))
        ));

        let params = ListParams {
            skip: Some("-5".into()),
            ..Default::default()
        };
        assert!(matches!(
            parse_list_params(params),
            Err(AppError::Validation(_))
        ));
    }
}
