use async_trait::async_trait;
use chrono::NaiveDate;
use domain::{Person, parse_birthday};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument};

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Failed to read data source '{location}': {source}")]
    DataSource {
        location: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Page size used when the caller asks for a negative one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

// --- Query contract ---

/// Normalized input to a directory query.
///
/// `page` and `page_size` are taken as-is here; the query engine applies
/// its own normalization (`page < 1` becomes 1, `page_size < 0` becomes
/// [`DEFAULT_PAGE_SIZE`]) and echoes the values it used in [`QueryResult`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    /// Case-insensitive substring matched against first and last name. Empty disables the filter.
    pub query: String,
    /// Inclusive lower bound on birthday.
    pub birthday_from: Option<NaiveDate>,
    /// Inclusive upper bound on birthday.
    pub birthday_to: Option<NaiveDate>,
    pub page: i64,
    pub page_size: i64,
}

/// Outcome of a directory query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// Records on the requested page, sorted by first name then last name.
    pub data: Vec<Person>,
    /// Number of records matching the filters before pagination.
    pub total: usize,
    pub page: i64,
    pub page_size: i64,
}

// --- Infrastructure Interfaces (Traits) ---

/// Read access to the in-memory person collection.
#[async_trait]
pub trait PersonRepository: Send + Sync {
    /// Returns an independent copy of every stored person.
    async fn get_all(&self) -> Vec<Person>;
    /// Filters, sorts and paginates the stored persons.
    async fn query(&self, params: &SearchParams) -> QueryResult;
    /// Number of stored persons.
    async fn count(&self) -> usize;
}

/// Something that can produce the initial set of validated persons.
#[async_trait]
pub trait PersonSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Person>, ApplicationError>;
}

// --- Request/Response Models (Data Transfer Objects - DTOs) ---

/// Raw query string of `GET /persons`.
///
/// Every field is kept as text so that malformed values can be replaced by
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Clone)]
pub struct PersonsQuery {
    pub query: Option<String>,
    pub birthday_from: Option<String>,
    pub birthday_to: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl PersonsQuery {
    /// Builds the query from decoded `key=value` pairs.
    ///
    /// A repeated key keeps its first value and unknown keys are ignored, so
    /// one odd parameter never discards the others.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut request = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "query" => &mut request.query,
                "birthdayFrom" => &mut request.birthday_from,
                "birthdayTo" => &mut request.birthday_to,
                "page" => &mut request.page,
                "pageSize" => &mut request.page_size,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        request
    }

    /// Unparseable dates become an absent bound; unparseable integers become 0.
    pub fn to_search_params(&self) -> SearchParams {
        SearchParams {
            query: self.query.clone().unwrap_or_default(),
            birthday_from: lenient_date(self.birthday_from.as_deref()),
            birthday_to: lenient_date(self.birthday_to.as_deref()),
            page: lenient_int(self.page.as_deref()),
            page_size: lenient_int(self.page_size.as_deref()),
        }
    }
}

fn lenient_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.filter(|value| !value.is_empty())
        .and_then(parse_birthday)
}

fn lenient_int(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.parse().ok()).unwrap_or(0)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonsResponse {
    pub data: Vec<Person>,
    pub total: usize,
    pub page: i64,
    pub page_size: i64,
}

impl From<QueryResult> for PersonsResponse {
    fn from(result: QueryResult) -> Self {
        Self {
            data: result.data,
            total: result.total,
            page: result.page,
            page_size: result.page_size,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub records: usize,
}

// --- Application Services (Use Cases) ---

/// Answers directory queries against an injected repository.
pub struct PersonService {
    repo: Arc<dyn PersonRepository>,
}

impl PersonService {
    pub fn new(repo: Arc<dyn PersonRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, request), fields(query = ?request.query, page = ?request.page, page_size = ?request.page_size))]
    pub async fn search_persons(&self, request: &PersonsQuery) -> PersonsResponse {
        let start_time = Instant::now();
        let params = request.to_search_params();
        debug!(?params, "Search parameters normalized from request");

        let result = self.repo.query(&params).await;

        info!(
            total = result.total,
            returned = result.data.len(),
            page = result.page,
            page_size = result.page_size,
            time_ms = start_time.elapsed().as_millis(),
            "Person search completed"
        );
        result.into()
    }

    pub async fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "ok".to_string(),
            records: self.repo.count().await,
        }
    }
}
