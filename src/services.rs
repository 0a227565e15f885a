use crate::errors::AppError;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Response of the name → gender lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenderizeResponse {
    /// `null` when the service has no guess for the name.
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub probability: f64,
}

/// One candidate country of the name → nationality lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryGuess {
    pub country_id: String,
    pub probability: f64,
}

/// Response of the name → nationality lookup, candidates ranked best first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NationalizeResponse {
    #[serde(default)]
    pub country: Vec<CountryGuess>,
}

/// Client for a Genderize-compatible endpoint.
#[derive(Clone)]
pub struct GenderizeService {
    client: Client,
    base_url: String,
}

impl GenderizeService {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Guess the gender for a first name.
    pub async fn guess(&self, name: &str) -> Result<GenderizeResponse, AppError> {
        tracing::debug!("Genderize: looking up name: {}", name);
        get_json(&self.client, &self.base_url, name, "Genderize").await
    }
}

/// Client for a Nationalize-compatible endpoint.
#[derive(Clone)]
pub struct NationalizeService {
    client: Client,
    base_url: String,
}

impl NationalizeService {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Guess the nationality for a first name.
    pub async fn guess(&self, name: &str) -> Result<NationalizeResponse, AppError> {
        tracing::debug!("Nationalize: looking up name: {}", name);
        get_json(&self.client, &self.base_url, name, "Nationalize").await
    }
}

/// `GET {base_url}?name={name}` and decode the JSON body.
async fn get_json<T>(
    client: &Client,
    base_url: &str,
    name: &str,
    service: &str,
) -> Result<T, AppError>
where
    T: for<'de> Deserialize<'de>,
{
    // Build URL with proper parameter encoding; names are often non-ASCII
    let url = reqwest::Url::parse_with_params(base_url, &[("name", name)])
        .map_err(|e| AppError::ExternalApi(format!("Failed to build {} URL: {}", service, e)))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::ExternalApi(format!("{} request failed: {}", service, e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AppError::ExternalApi(format!(
            "{} returned status {}: {}",
            service, status, error_text
        )));
    }

    response.json().await.map_err(|e| {
        AppError::ExternalApi(format!("Failed to parse {} response: {}", service, e))
    })
}
