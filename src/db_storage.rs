use crate::errors::{AppError, ResultExt};
use crate::models::{NewPerson, Page, Person, PersonFilter};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Persistence gateway for person records.
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Inserts a record and returns it with its assigned id.
    async fn create(&self, person: NewPerson) -> Result<Person, AppError>;

    /// Fetches one record, `AppError::NotFound` if absent.
    async fn get(&self, id: i64) -> Result<Person, AppError>;

    /// Lists records matching every set filter, ordered by id.
    async fn list(&self, filter: &PersonFilter, page: Page) -> Result<Vec<Person>, AppError>;

    /// Replaces every column of an existing record.
    async fn update(&self, id: i64, person: Person) -> Result<Person, AppError>;

    /// Hard-deletes a record, `AppError::NotFound` if nothing was removed.
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

const PERSON_COLUMNS: &str = "id, name, surname, patronymic, age, gender, nationality";

/// Postgres-backed store over the `people` table.
#[derive(Clone)]
pub struct PgPersonStore {
    pool: PgPool,
}

impl PgPersonStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersonStore for PgPersonStore {
    async fn create(&self, person: NewPerson) -> Result<Person, AppError> {
        let stored = sqlx::query_as::<_, Person>(&format!(
            r#"
            INSERT INTO people (name, surname, patronymic, age, gender, nationality)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PERSON_COLUMNS
        ))
        .bind(&person.name)
        .bind(&person.surname)
        .bind(&person.patronymic)
        .bind(person.age)
        .bind(&person.gender)
        .bind(&person.nationality)
        .fetch_one(&self.pool)
        .await
        .context("inserting person")?;

        Ok(stored)
    }

    async fn get(&self, id: i64) -> Result<Person, AppError> {
        sqlx::query_as::<_, Person>(&format!(
            "SELECT {} FROM people WHERE id = $1",
            PERSON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("fetching person {}", id))?
        .ok_or_else(|| AppError::person_not_found(id))
    }

    async fn list(&self, filter: &PersonFilter, page: Page) -> Result<Vec<Person>, AppError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM people WHERE TRUE", PERSON_COLUMNS));

        if let Some(ref name) = filter.name {
            query
                .push(" AND name ILIKE ")
                .push_bind(contains_pattern(name))
                .push(r" ESCAPE '\'");
        }
        if let Some(ref surname) = filter.surname {
            query
                .push(" AND surname ILIKE ")
                .push_bind(contains_pattern(surname))
                .push(r" ESCAPE '\'");
        }
        if let Some(age) = filter.age {
            query.push(" AND age = ").push_bind(age);
        }
        if let Some(ref gender) = filter.gender {
            query.push(" AND gender = ").push_bind(gender.clone());
        }
        if let Some(ref nationality) = filter.nationality {
            query.push(" AND nationality = ").push_bind(nationality.clone());
        }

        query
            .push(" ORDER BY id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let people = query
            .build_query_as::<Person>()
            .fetch_all(&self.pool)
            .await
            .context("listing people")?;

        Ok(people)
    }

    async fn update(&self, id: i64, person: Person) -> Result<Person, AppError> {
        sqlx::query_as::<_, Person>(&format!(
            r#"
            UPDATE people
            SET name = $2,
                surname = $3,
                patronymic = $4,
                age = $5,
                gender = $6,
                nationality = $7
            WHERE id = $1
            RETURNING {}
            "#,
            PERSON_COLUMNS
        ))
        .bind(id)
        .bind(&person.name)
        .bind(&person.surname)
        .bind(&person.patronymic)
        .bind(person.age)
        .bind(&person.gender)
        .bind(&person.nationality)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("updating person {}", id))?
        .ok_or_else(|| AppError::person_not_found(id))
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM people WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("deleting person {}", id))?;

        if result.rows_affected() == 0 {
            return Err(AppError::person_not_found(id));
        }
        Ok(())
    }
}

/// `ILIKE` pattern matching `needle` literally anywhere in the column.
fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("ив"), "%ив%");
        assert_eq!(contains_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
