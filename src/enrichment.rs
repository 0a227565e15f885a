//! Best-effort gender and nationality inference for new people.
//!
//! Both lookups run concurrently and never fail the caller: every outcome
//! is classified as a [`Lookup`] and only [`Lookup::Accepted`] values end up
//! on the record.

use crate::config::Config;
use crate::errors::AppError;
use crate::models::NewPerson;
use crate::services::{GenderizeResponse, GenderizeService, NationalizeResponse, NationalizeService};
use std::time::Duration;

/// A gender guess is kept only above this probability.
pub const GENDER_THRESHOLD: f64 = 0.7;
/// The top nationality guess is kept only above this probability.
pub const NATIONALITY_THRESHOLD: f64 = 0.3;

/// Classified outcome of one lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Confident enough to store.
    Accepted(T),
    /// The service answered but not confidently enough (or had no guess).
    Rejected { probability: f64 },
    /// Network error, timeout, bad status or malformed body.
    Failed(String),
    /// Enrichment is switched off.
    Skipped,
}

impl<T> Lookup<T> {
    pub fn accepted(self) -> Option<T> {
        match self {
            Lookup::Accepted(value) => Some(value),
            _ => None,
        }
    }
}

/// Both lookup outcomes for one name.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub gender: Lookup<String>,
    pub nationality: Lookup<String>,
}

impl Enrichment {
    pub fn skipped() -> Self {
        Self {
            gender: Lookup::Skipped,
            nationality: Lookup::Skipped,
        }
    }

    /// Copies accepted values onto the person. Other outcomes leave it untouched.
    pub fn apply_to(self, person: &mut NewPerson) {
        if let Some(gender) = self.gender.accepted() {
            person.gender = Some(gender);
        }
        if let Some(nationality) = self.nationality.accepted() {
            person.nationality = Some(nationality);
        }
    }
}

/// Judge a gender response against [`GENDER_THRESHOLD`].
pub fn classify_gender(response: GenderizeResponse) -> Lookup<String> {
    match response.gender.filter(|g| !g.is_empty()) {
        Some(gender) if response.probability > GENDER_THRESHOLD => Lookup::Accepted(gender),
        _ => Lookup::Rejected {
            probability: response.probability,
        },
    }
}

/// Judge the top nationality candidate against [`NATIONALITY_THRESHOLD`].
pub fn classify_nationality(response: NationalizeResponse) -> Lookup<String> {
    match response.country.into_iter().next() {
        Some(top) if top.probability > NATIONALITY_THRESHOLD && !top.country_id.is_empty() => {
            Lookup::Accepted(top.country_id)
        }
        Some(top) => Lookup::Rejected {
            probability: top.probability,
        },
        None => Lookup::Rejected { probability: 0.0 },
    }
}

fn classify<R>(
    result: Result<R, AppError>,
    judge: impl FnOnce(R) -> Lookup<String>,
) -> Lookup<String> {
    match result {
        Ok(response) => judge(response),
        Err(e) => Lookup::Failed(e.to_string()),
    }
}

/// Runs both name lookups for new records.
#[derive(Clone)]
pub struct NameEnricher {
    lookups: Option<(GenderizeService, NationalizeService)>,
}

impl NameEnricher {
    /// Builds the HTTP clients from configuration. Each request is bounded by
    /// `enrichment_timeout_secs`.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        if !config.enrichment_enabled {
            return Ok(Self::disabled());
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.enrichment_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::ExternalApi(format!("Failed to create enrichment client: {}", e))
            })?;

        Ok(Self {
            lookups: Some((
                GenderizeService::new(client.clone(), config.genderize_url.clone()),
                NationalizeService::new(client, config.nationalize_url.clone()),
            )),
        })
    }

    /// An enricher that never calls out.
    pub fn disabled() -> Self {
        Self { lookups: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.lookups.is_some()
    }

    /// Look up gender and nationality for `name` concurrently.
    pub async fn enrich(&self, name: &str) -> Enrichment {
        let Some((genderize, nationalize)) = &self.lookups else {
            return Enrichment::skipped();
        };

        let (gender, nationality) = tokio::join!(genderize.guess(name), nationalize.guess(name));

        let enrichment = Enrichment {
            gender: classify(gender, classify_gender),
            nationality: classify(nationality, classify_nationality),
        };

        log_outcome("gender", name, &enrichment.gender);
        log_outcome("nationality", name, &enrichment.nationality);

        enrichment
    }
}

fn log_outcome(field: &str, name: &str, lookup: &Lookup<String>) {
    match lookup {
        Lookup::Accepted(value) => {
            tracing::debug!("Enrichment: {} for '{}' accepted: {}", field, name, value)
        }
        Lookup::Rejected { probability } => tracing::debug!(
            "Enrichment: {} for '{}' rejected (probability {:.2})",
            field,
            name,
            probability
        ),
        Lookup::Failed(reason) => {
            tracing::warn!("Enrichment: {} lookup for '{}' failed: {}", field, name, reason)
        }
        Lookup::Skipped => {}
    }
}
