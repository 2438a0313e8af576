//! Writer/reader behavior against the in-memory store.

use std::collections::BTreeSet;
use std::time::Duration;

use roster_graph::{
    add_person, people_with_prefix, print_people, GraphError, MemoryStore, RetryPolicy,
};

const NAMES: [&str; 3] = ["Ada Lovelace", "Alan Turing", "Billy Bob Thornton"];

async fn collect(store: &MemoryStore, prefix: &str) -> BTreeSet<String> {
    let mut people = people_with_prefix(store, prefix).await.unwrap();
    let mut names = BTreeSet::new();
    while let Some(name) = people.next().await.unwrap() {
        names.insert(name);
    }
    names
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn test_prefix_a_returns_ada_and_alan() {
    let store = MemoryStore::new();
    for name in NAMES {
        add_person(&store, name).await.unwrap();
    }

    assert_eq!(collect(&store, "A").await, set(&["Ada Lovelace", "Alan Turing"]));
}

#[tokio::test]
async fn test_double_write_leaves_one_node() {
    let store = MemoryStore::new();
    add_person(&store, "Ada Lovelace").await.unwrap();
    add_person(&store, "Ada Lovelace").await.unwrap();

    assert_eq!(store.count_named("Ada Lovelace"), 1);
}

#[tokio::test]
async fn test_triple_write_leaves_one_node_per_name() {
    let store = MemoryStore::new();
    for _ in 0..3 {
        for name in NAMES {
            add_person(&store, name).await.unwrap();
        }
    }

    for name in NAMES {
        assert_eq!(store.count_named(name), 1, "{name}");
    }
    assert_eq!(store.names().len(), NAMES.len());
}

#[tokio::test]
async fn test_unmatched_prefix_is_empty() {
    let store = MemoryStore::new();
    for name in NAMES {
        add_person(&store, name).await.unwrap();
    }

    let mut out: Vec<u8> = Vec::new();
    let printed = print_people(&store, "Z", &mut out).await.unwrap();

    assert_eq!(printed, 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_prefix_matches_exactly_the_starting_names() {
    let store = MemoryStore::new();
    for name in NAMES {
        add_person(&store, name).await.unwrap();
    }

    for prefix in ["", "A", "Ad", "Al", "B", "a", "Ada Lovelace", "Ada Lovelace!", " "] {
        let expected: BTreeSet<String> = NAMES
            .iter()
            .filter(|n| n.starts_with(prefix))
            .map(|n| n.to_string())
            .collect();
        assert_eq!(collect(&store, prefix).await, expected, "prefix {prefix:?}");
    }
}

#[tokio::test]
async fn test_write_order_does_not_change_results() {
    let forward = MemoryStore::new();
    for name in NAMES {
        add_person(&forward, name).await.unwrap();
    }
    let backward = MemoryStore::new();
    for name in NAMES.iter().rev() {
        add_person(&backward, name).await.unwrap();
    }

    for prefix in ["A", "B", "Z"] {
        assert_eq!(collect(&forward, prefix).await, collect(&backward, prefix).await);
    }
}

#[tokio::test]
async fn test_store_retries_transient_write_failures() {
    let store = MemoryStore::with_retry(RetryPolicy {
        max_retry_time: Duration::from_secs(5),
        initial_delay: Duration::from_millis(1),
        multiplier: 2.0,
    });
    store.fail_next_writes(2);

    add_person(&store, "Alan Turing").await.unwrap();

    assert_eq!(store.write_attempts(), 3);
    assert_eq!(store.count_named("Alan Turing"), 1);
    assert_eq!(store.open_sessions(), 0);
}

#[tokio::test]
async fn test_exhausted_retries_surface_the_store_error() {
    let store = MemoryStore::new();
    store.fail_next_writes(1);

    let err = add_person(&store, "Alan Turing").await.unwrap_err();

    assert!(matches!(err, GraphError::Unavailable(_)));
    assert!(store.names().is_empty());
    assert_eq!(store.open_sessions(), 0);
}

#[tokio::test]
async fn test_full_run_releases_every_session() {
    let store = MemoryStore::new();
    for name in ["Billy Bob Thornton", "Ada Lovelace", "Alan Turing"] {
        add_person(&store, name).await.unwrap();
    }
    let mut out: Vec<u8> = Vec::new();
    print_people(&store, "A", &mut out).await.unwrap();

    let printed: BTreeSet<String> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(printed, set(&["Ada Lovelace", "Alan Turing"]));
    assert_eq!(store.sessions_opened(), 4);
    assert_eq!(store.open_sessions(), 0);
}
