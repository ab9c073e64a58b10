use crate::search::query_engine;
use application::{PersonRepository, QueryResult, SearchParams};
use async_trait::async_trait;
use domain::Person;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Thread-safe in-memory store for the person collection.
///
/// The collection is handed over fully populated at construction and is
/// only ever read afterwards, so queries take the shared lock and run in
/// parallel. Clones share the same collection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPersonRepository {
    persons: Arc<RwLock<Vec<Person>>>,
}

impl InMemoryPersonRepository {
    pub fn new(initial: Vec<Person>) -> Self {
        debug!(count = initial.len(), "Creating in-memory person store");
        Self {
            persons: Arc::new(RwLock::new(initial)),
        }
    }
}

#[async_trait]
impl PersonRepository for InMemoryPersonRepository {
    #[instrument(skip(self))]
    async fn get_all(&self) -> Vec<Person> {
        let persons = self.persons.read().await;
        debug!(count = persons.len(), "Copying all persons from in-memory store");
        persons.clone()
    }

    #[instrument(skip(self))]
    async fn query(&self, params: &SearchParams) -> QueryResult {
        // The read guard lives for the whole query so no partial collection is ever observed.
        let persons = self.persons.read().await;
        let result = query_engine::execute(&persons, params);
        debug!(
            total = result.total,
            returned = result.data.len(),
            "In-memory query finished."
        );
        result
    }

    async fn count(&self) -> usize {
        self.persons.read().await.len()
    }
}
