use application::{ApplicationError, PersonSource};
use async_trait::async_trait;
use domain::{DomainError, Person, PersonRecord};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

/// Reasons a single data file is skipped. None of them abort a load.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read: {0}")]
    Io(#[from] std::io::Error),
    #[error("file is empty")]
    Empty,
    #[error("invalid JSON format: must be an object or an array")]
    UnsupportedShape,
    #[error("malformed JSON {kind}: {source}")]
    Malformed {
        kind: &'static str,
        source: serde_json::Error,
    },
    #[error("invalid person record: {0}")]
    InvalidRecord(#[from] DomainError),
}

/// Loads persons from every `*.json` file of a directory.
///
/// Each file is read and decoded on its own task; results are merged once
/// all tasks are done. A bad file is logged and skipped.
#[derive(Debug, Clone)]
pub struct DirectoryPersonSource {
    dir: PathBuf,
}

impl DirectoryPersonSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn json_files(&self) -> Result<Vec<PathBuf>, std::io::Error> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                continue;
            }
            let path = entry.path();
            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if is_json {
                files.push(path);
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl PersonSource for DirectoryPersonSource {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn load(&self) -> Result<Vec<Person>, ApplicationError> {
        let files = self
            .json_files()
            .await
            .map_err(|e| ApplicationError::DataSource {
                location: self.dir.display().to_string(),
                source: Box::new(e),
            })?;
        debug!(files = files.len(), "Discovered person files");

        let mut tasks: JoinSet<(PathBuf, Result<Vec<Person>, LoadError>)> = JoinSet::new();
        for path in files {
            tasks.spawn(async move {
                let result = read_person_file(&path).await;
                (path, result)
            });
        }

        let mut persons = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((path, Ok(parsed))) => {
                    debug!(file = %path.display(), count = parsed.len(), "Loaded person file");
                    persons.extend(parsed);
                }
                Ok((path, Err(e))) => {
                    warn!(file = %path.display(), "Skipping file: {}", e);
                }
                Err(e) => {
                    error!("Person file task failed: {}", e);
                }
            }
        }

        info!(count = persons.len(), "Successfully loaded person records.");
        Ok(persons)
    }
}

async fn read_person_file(path: &Path) -> Result<Vec<Person>, LoadError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_person_file(&bytes, &file_name)
}

/// Decodes one data file holding either a single person object or an array.
///
/// Invalid entries of an array are skipped with a warning; an invalid single
/// object fails the whole file.
pub fn parse_person_file(bytes: &[u8], file_name: &str) -> Result<Vec<Person>, LoadError> {
    let trimmed = bytes.trim_ascii();
    match trimmed.first() {
        None => Err(LoadError::Empty),
        Some(b'[') => {
            let records: Vec<PersonRecord> =
                serde_json::from_slice(trimmed).map_err(|source| LoadError::Malformed {
                    kind: "array",
                    source,
                })?;
            let mut valid = Vec::with_capacity(records.len());
            for (index, record) in records.into_iter().enumerate() {
                match Person::try_from(record) {
                    Ok(person) => valid.push(person),
                    Err(e) => {
                        warn!(file = %file_name, index, "Skipping invalid record: {}", e);
                    }
                }
            }
            Ok(valid)
        }
        Some(b'{') => {
            let record: PersonRecord =
                serde_json::from_slice(trimmed).map_err(|source| LoadError::Malformed {
                    kind: "object",
                    source,
                })?;
            Ok(vec![Person::try_from(record)?])
        }
        Some(_) => Err(LoadError::UnsupportedShape),
    }
}
