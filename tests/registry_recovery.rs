//! Registry Recovery Tests
//!
//! Topics with a log on disk must be registered by `load_from_disk` before
//! any traffic, and the registry must never hold two topics for one name.

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use emberq::registry::TopicRegistry;
use emberq::topic::{TopicConfig, MAX_TOPIC_NAME_LEN};
use tempfile::TempDir;

fn config() -> TopicConfig {
    TopicConfig {
        sweep_interval: Duration::from_secs(3600),
        ..TopicConfig::default()
    }
}

#[test]
fn test_load_recovers_every_topic() {
    let temp = TempDir::new().unwrap();
    {
        let registry = TopicRegistry::new(temp.path(), config());
        registry.enqueue("orders", "o1").unwrap();
        registry.enqueue("orders", "o2").unwrap();
        registry.enqueue("billing", "b1").unwrap();
        registry.close_all();
    }

    let registry = TopicRegistry::new(temp.path(), config());
    assert!(registry.is_empty());

    let recovered = registry.load_from_disk(&config()).unwrap();
    assert_eq!(recovered, 2);
    assert_eq!(
        registry.topic_names(),
        vec!["billing".to_string(), "orders".to_string()]
    );

    assert_eq!(registry.dequeue("orders").unwrap().payload, "o1");
    assert_eq!(registry.dequeue("billing").unwrap().payload, "b1");
    assert_eq!(registry.enqueue("orders", "o3").unwrap(), 3);
}

#[test]
fn test_load_twice_registers_once() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("events.wal"), b"").unwrap();

    let registry = TopicRegistry::new(temp.path(), config());
    assert_eq!(registry.load_from_disk(&config()).unwrap(), 1);
    let first = registry.get_topic("events").unwrap();

    assert_eq!(registry.load_from_disk(&config()).unwrap(), 0);
    let second = registry.get_topic("events").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_load_uses_given_config() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("events.wal"), b"").unwrap();

    let registry = TopicRegistry::new(temp.path(), config());
    let custom = TopicConfig {
        max_retries: 7,
        ..config()
    };
    registry.load_from_disk(&custom).unwrap();

    assert_eq!(registry.get_topic("events").unwrap().config().max_retries, 7);
}

#[test]
fn test_acknowledged_state_survives_registry_restart() {
    let temp = TempDir::new().unwrap();
    {
        let registry = TopicRegistry::new(temp.path(), config());
        registry.enqueue("jobs", "a").unwrap();
        registry.enqueue("jobs", "b").unwrap();
        let msg = registry.dequeue("jobs").unwrap();
        assert!(registry.acknowledge("jobs", msg.id));
    }

    let registry = TopicRegistry::new(temp.path(), config());
    registry.load_from_disk(&config()).unwrap();

    let next = registry.dequeue("jobs").unwrap();
    assert_eq!(next.payload, "b");
    assert!(registry.dequeue("jobs").is_none());
}

#[test]
fn test_concurrent_creation_yields_one_topic() {
    let temp = TempDir::new().unwrap();
    let registry = Arc::new(TopicRegistry::new(temp.path(), config()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.get_or_create_topic("shared").unwrap())
        })
        .collect();

    let topics: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(topics.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_close_all_drains_logs() {
    let temp = TempDir::new().unwrap();
    let registry = TopicRegistry::new(temp.path(), config());
    for i in 0..20 {
        registry.enqueue("a", format!("{}", i)).unwrap();
        registry.enqueue("b", format!("{}", i)).unwrap();
    }
    registry.close_all();

    for name in ["a", "b"] {
        let topic = registry.get_topic(name).unwrap();
        assert!(topic.is_closed());
        assert_eq!(topic.metrics().snapshot().wal_records_written, 20);
    }
}

#[test]
fn test_longest_valid_name_gets_a_log_file() {
    let temp = TempDir::new().unwrap();
    let registry = TopicRegistry::new(temp.path(), config());

    let longest = "t".repeat(MAX_TOPIC_NAME_LEN);
    assert_eq!(registry.enqueue(&longest, "m").unwrap(), 1);
    assert!(registry.get_topic(&longest).unwrap().log_path().exists());

    let err = registry.enqueue(&"t".repeat(255), "m").unwrap_err();
    assert!(err.is_invalid_name());
    assert_eq!(registry.len(), 1);
}
