pub mod directory_source;

pub use directory_source::{DirectoryPersonSource, LoadError, parse_person_file};
