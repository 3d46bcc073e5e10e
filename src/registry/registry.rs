//! Topic registry
//!
//! The registry is the only place topics are opened, so at most one
//! `Topic` exists per name and per log file. Lookups take a read lock;
//! creation takes the write lock and opens the topic while holding it, which
//! keeps two racing creators from replaying and appending to the same file.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::observability::{log_event, Event, ObservationScope};
use crate::sync::{read, write};
use crate::topic::{validate_topic_name, Message, Topic, TopicConfig};
use crate::wal::WAL_FILE_EXTENSION;

use super::errors::{RegistryError, RegistryResult};

/// Owns every topic of one data directory.
pub struct TopicRegistry {
    data_dir: PathBuf,
    default_config: TopicConfig,
    topics: RwLock<HashMap<String, Arc<Topic>>>,
}

impl TopicRegistry {
    /// Creates an empty registry. Nothing is read from disk until
    /// `load_from_disk`.
    pub fn new(data_dir: impl Into<PathBuf>, default_config: TopicConfig) -> Self {
        Self {
            data_dir: data_dir.into(),
            default_config,
            topics: RwLock::new(HashMap::new()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn default_config(&self) -> &TopicConfig {
        &self.default_config
    }

    pub fn get_topic(&self, name: &str) -> Option<Arc<Topic>> {
        read(&self.topics).get(name).cloned()
    }

    /// Opens `name` with the default configuration unless it is already
    /// registered.
    pub fn create_topic(&self, name: &str) -> RegistryResult<()> {
        self.get_or_create_topic(name).map(|_| ())
    }

    pub fn get_or_create_topic(&self, name: &str) -> RegistryResult<Arc<Topic>> {
        if let Some(topic) = self.get_topic(name) {
            return Ok(topic);
        }

        let mut topics = write(&self.topics);
        if let Some(topic) = topics.get(name) {
            return Ok(Arc::clone(topic));
        }

        let topic = self.open_topic(name, self.default_config.clone())?;
        topics.insert(name.to_string(), Arc::clone(&topic));
        log_event(Event::TopicCreated, &[("topic", name)]);
        Ok(topic)
    }

    fn open_topic(&self, name: &str, config: TopicConfig) -> RegistryResult<Arc<Topic>> {
        match Topic::open(&self.data_dir, name, config) {
            Ok(topic) => Ok(Arc::new(topic)),
            Err(e) => {
                log_event(
                    Event::TopicRejected,
                    &[("topic", name), ("reason", &e.to_string())],
                );
                Err(RegistryError::topic(name, e))
            }
        }
    }

    /// Appends `payload` to `topic_name`, creating the topic if needed.
    pub fn enqueue(&self, topic_name: &str, payload: impl Into<String>) -> RegistryResult<i64> {
        Ok(self.get_or_create_topic(topic_name)?.enqueue(payload))
    }

    /// Next message of `topic_name`. Unknown topics have nothing to deliver.
    pub fn dequeue(&self, topic_name: &str) -> Option<Message> {
        self.get_topic(topic_name)?.dequeue()
    }

    pub fn acknowledge(&self, topic_name: &str, id: i64) -> bool {
        self.get_topic(topic_name)
            .map(|topic| topic.acknowledge(id))
            .unwrap_or(false)
    }

    /// Opens every topic that has a log in the data directory and is not
    /// registered yet, replaying its log with `default_config`.
    ///
    /// Must finish before requests are accepted. A missing data directory
    /// means there is nothing to recover. Files whose stem is not a valid
    /// topic name are skipped.
    ///
    /// # Returns
    ///
    /// Number of topics recovered by this call.
    pub fn load_from_disk(&self, default_config: &TopicConfig) -> RegistryResult<usize> {
        let dir = self.data_dir.display().to_string();
        let scope = ObservationScope::with_fields("REGISTRY_LOAD", &[("data_dir", &dir)]);

        let names = match self.scan_log_names() {
            Ok(names) => names,
            Err(e) => {
                scope.fail(&e.to_string());
                return Err(e);
            }
        };

        if names.is_empty() {
            log_event(Event::RegistryLoadEmpty, &[("data_dir", &dir)]);
        }

        let mut recovered = 0;
        for name in names {
            if validate_topic_name(&name).is_err() {
                log_event(
                    Event::TopicRejected,
                    &[("topic", &name), ("reason", "not a valid topic name")],
                );
                continue;
            }

            let mut topics = write(&self.topics);
            if topics.contains_key(&name) {
                continue;
            }

            let topic = match self.open_topic(&name, default_config.clone()) {
                Ok(topic) => topic,
                Err(e) => {
                    drop(topics);
                    scope.fail(&e.to_string());
                    return Err(e);
                }
            };

            let stats = topic.stats();
            log_event(
                Event::TopicRecovered,
                &[
                    ("topic", &name),
                    ("pending", &stats.pending.to_string()),
                    ("in_flight", &stats.in_flight.to_string()),
                    ("next_id", &stats.next_id.to_string()),
                ],
            );
            topics.insert(name, topic);
            recovered += 1;
        }

        scope.complete_with_fields(&[("topics", &recovered.to_string())]);
        Ok(recovered)
    }

    /// Stems of `*.wal` files in the data directory, sorted.
    fn scan_log_names(&self) -> RegistryResult<Vec<String>> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(RegistryError::Scan {
                    dir: self.data_dir.clone(),
                    source,
                })
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| RegistryError::Scan {
                dir: self.data_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(WAL_FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Registered topic names, sorted.
    pub fn topic_names(&self) -> Vec<String> {
        let mut names: Vec<String> = read(&self.topics).keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered topics, sorted by name.
    pub fn topics(&self) -> Vec<Arc<Topic>> {
        let mut topics: Vec<Arc<Topic>> = read(&self.topics).values().cloned().collect();
        topics.sort_by(|a, b| a.name().cmp(b.name()));
        topics
    }

    pub fn len(&self) -> usize {
        read(&self.topics).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes every topic, draining each log. Topics stay registered.
    pub fn close_all(&self) {
        for topic in self.topics() {
            topic.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config() -> TopicConfig {
        TopicConfig {
            sweep_interval: Duration::from_secs(3600),
            ..TopicConfig::default()
        }
    }

    #[test]
    fn test_unknown_topic_is_absent() {
        let temp = TempDir::new().unwrap();
        let registry = TopicRegistry::new(temp.path(), config());

        assert!(registry.get_topic("missing").is_none());
        assert!(registry.dequeue("missing").is_none());
        assert!(!registry.acknowledge("missing", 1));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_create_topic_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let registry = TopicRegistry::new(temp.path(), config());

        registry.create_topic("orders").unwrap();
        let first = registry.get_topic("orders").unwrap();
        registry.create_topic("orders").unwrap();
        let second = registry.get_topic("orders").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_enqueue_creates_topic() {
        let temp = TempDir::new().unwrap();
        let registry = TopicRegistry::new(temp.path(), config());

        assert_eq!(registry.enqueue("orders", "a").unwrap(), 1);
        assert_eq!(registry.topic_names(), vec!["orders".to_string()]);

        let msg = registry.dequeue("orders").unwrap();
        assert!(registry.acknowledge("orders", msg.id));
    }

    #[test]
    fn test_invalid_name_is_not_registered() {
        let temp = TempDir::new().unwrap();
        let registry = TopicRegistry::new(temp.path(), config());

        let err = registry.enqueue("../escape", "x").unwrap_err();
        assert!(err.is_invalid_name());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_from_missing_directory() {
        let temp = TempDir::new().unwrap();
        let registry = TopicRegistry::new(temp.path().join("absent"), config());
        assert_eq!(registry.load_from_disk(&config()).unwrap(), 0);
    }

    #[test]
    fn test_load_skips_foreign_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("notes.txt"), b"hello").unwrap();
        fs::write(temp.path().join(".hidden.wal"), b"").unwrap();
        fs::write(temp.path().join("orders.wal"), b"").unwrap();

        let registry = TopicRegistry::new(temp.path(), config());
        assert_eq!(registry.load_from_disk(&config()).unwrap(), 1);
        assert_eq!(registry.topic_names(), vec!["orders".to_string()]);
    }
}
