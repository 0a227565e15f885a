use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

// ============ Database Models ============

/// A stored person.
///
/// Unset optional attributes are omitted from JSON entirely rather than
/// serialized as `null`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Person {
    /// Server-assigned identifier.
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Дмитрий")]
    pub name: String,
    #[schema(example = "Ушаков")]
    pub surname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Васильевич")]
    pub patronymic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "male")]
    pub gender: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "RU")]
    pub nationality: Option<String>,
}

/// A person that has not been assigned an id yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPerson {
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
}

impl NewPerson {
    pub fn with_id(self, id: i64) -> Person {
        Person {
            id,
            name: self.name,
            surname: self.surname,
            patronymic: self.patronymic,
            age: self.age,
            gender: self.gender,
            nationality: self.nationality,
        }
    }
}

// ============ API Request/Response Models ============

/// Body of `POST /people`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PersonCreate {
    #[schema(example = "Дмитрий")]
    pub name: String,
    #[schema(example = "Ушаков")]
    pub surname: String,
    #[serde(default)]
    #[schema(example = "Васильевич")]
    pub patronymic: Option<String>,
}

/// Body of `PUT /people/{id}`.
///
/// Each field distinguishes three states: absent (`None`, left untouched),
/// explicit `null` (`Some(None)`, clears the field) and a value
/// (`Some(Some(v))`, overwrites).
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PersonUpdate {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, example = "Иван")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub surname: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub patronymic: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i32>)]
    pub age: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub nationality: Option<Option<String>>,
}

/// Marks a field as present; `null` becomes `Some(None)`.
/// Absent fields never reach this and fall back to `Default` (`None`).
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl PersonUpdate {
    /// Overwrites the fields present in this patch. Absent fields are untouched.
    pub fn apply_to(self, person: &mut Person) {
        if let Some(name) = self.name {
            person.name = name.unwrap_or_default();
        }
        if let Some(surname) = self.surname {
            person.surname = surname.unwrap_or_default();
        }
        if let Some(patronymic) = self.patronymic {
            person.patronymic = non_empty(patronymic);
        }
        if let Some(age) = self.age {
            person.age = age;
        }
        if let Some(gender) = self.gender {
            person.gender = non_empty(gender);
        }
        if let Some(nationality) = self.nationality {
            person.nationality = non_empty(nationality);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.surname.is_none()
            && self.patronymic.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.nationality.is_none()
    }
}

/// Empty strings mean "unset" for optional text attributes.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Raw query string of `GET /people`.
///
/// Kept as strings so empty values can be treated as absent and numeric
/// parse failures reported as validation errors.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    /// Case-insensitive substring of the surname.
    pub surname: Option<String>,
    /// Exact age.
    #[param(value_type = Option<i32>)]
    pub age: Option<String>,
    /// Exact gender.
    pub gender: Option<String>,
    /// Exact nationality code.
    pub nationality: Option<String>,
    /// Records to skip (default 0).
    #[param(value_type = Option<i64>)]
    pub skip: Option<String>,
    /// Maximum records to return (default 10).
    #[param(value_type = Option<i64>)]
    pub limit: Option<String>,
}

/// Conjunctive filter over people. `None` fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonFilter {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
}

impl PersonFilter {
    pub fn matches(&self, person: &Person) -> bool {
        fn contains_ci(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }

        self.name
            .as_deref()
            .map_or(true, |n| contains_ci(&person.name, n))
            && self
                .surname
                .as_deref()
                .map_or(true, |s| contains_ci(&person.surname, s))
            && self.age.map_or(true, |a| person.age == Some(a))
            && self
                .gender
                .as_deref()
                .map_or(true, |g| person.gender.as_deref() == Some(g))
            && self
                .nationality
                .as_deref()
                .map_or(true, |n| person.nationality.as_deref() == Some(n))
    }
}

pub const DEFAULT_OFFSET: i64 = 0;
pub const DEFAULT_LIMIT: i64 = 10;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Body of a successful delete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Person deleted")]
    pub message: String,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Storage error")]
    pub error: String,
}
