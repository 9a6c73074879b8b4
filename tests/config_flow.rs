//! End-to-end tests for the namespace and configuration file lifecycle.

mod common;

use common::{update_request, TestEnv, TEST_EMAIL};
use gitvault::errors::codes;
use gitvault::notify::NotificationStatus;
use gitvault::storage::config_store::DeleteRequest;

#[test]
fn test_create_namespace_and_config_file() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.store.initialize("prod/user-svc.yml", "user-svc", TEST_EMAIL).unwrap();

    let content = env.store.read("prod/user-svc.yml").unwrap();
    assert!(content.contains("name: user-svc"));
    assert!(!content.contains("<app-name>"));

    // The first and only commit is the template commit.
    let history = env.store.history("prod/user-svc.yml").unwrap();
    assert_eq!(history.commits.len(), 1);
    assert_eq!(
        history.commits[0].commit_message.as_deref(),
        Some("First commit ApplicationName - user-svc")
    );
    assert_eq!(history.commits[0].author, "dev");

    let latest = env.store.latest_commit_id("prod/user-svc.yml").unwrap();
    assert_eq!(latest, history.commits[0].commit_id);
}

#[test]
fn test_create_config_twice_conflicts() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.store.initialize("prod/user-svc.yml", "user-svc", TEST_EMAIL).unwrap();

    let err = env.store.initialize("prod/user-svc.yml", "user-svc", TEST_EMAIL).unwrap_err();
    assert_eq!(err.code(), codes::CONFIG_FILE_ALREADY_EXISTS);
}

#[test]
fn test_update_advances_commit_and_preserves_keys() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.store.initialize("prod/user-svc.yml", "user-svc", TEST_EMAIL).unwrap();

    let base = env.store.latest_commit_id("prod/user-svc.yml").unwrap();
    let new_commit = env
        .store
        .update(
            "prod/user-svc.yml",
            &update_request("user-svc", "server:\n  port: 9090\ndb:\n  host: local\n", &base),
        )
        .unwrap();

    assert_ne!(new_commit, base);
    assert_eq!(env.store.latest_commit_id("prod/user-svc.yml").unwrap(), new_commit);

    let content = env.store.read("prod/user-svc.yml").unwrap();
    assert!(content.contains("port: 9090"));
    assert!(content.contains("host: local"));
}

#[test]
fn test_update_with_stale_commit_id_conflicts() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.store.initialize("prod/user-svc.yml", "user-svc", TEST_EMAIL).unwrap();

    let base = env.store.latest_commit_id("prod/user-svc.yml").unwrap();
    env.store
        .update("prod/user-svc.yml", &update_request("user-svc", "a: 1\n", &base))
        .unwrap();

    // Same base commit again: the optimistic check must fail.
    let err = env
        .store
        .update("prod/user-svc.yml", &update_request("user-svc", "a: 2\n", &base))
        .unwrap_err();
    assert_eq!(err.code(), codes::CONFIG_CONFLICT);
}

#[test]
fn test_concurrent_updates_exactly_one_wins() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.store.initialize("prod/user-svc.yml", "user-svc", TEST_EMAIL).unwrap();
    let base = env.store.latest_commit_id("prod/user-svc.yml").unwrap();

    let store_a = env.store.clone();
    let store_b = env.store.clone();
    let base_a = base.clone();
    let base_b = base.clone();

    let writer_a = std::thread::spawn(move || {
        store_a.update("prod/user-svc.yml", &update_request("user-svc", "writer: a\n", &base_a))
    });
    let writer_b = std::thread::spawn(move || {
        store_b.update("prod/user-svc.yml", &update_request("user-svc", "writer: b\n", &base_b))
    });

    let results = [writer_a.join().unwrap(), writer_b.join().unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.code() == codes::CONFIG_CONFLICT))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);
}

#[test]
fn test_update_without_history_is_not_found() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();

    let err = env
        .store
        .update("prod/ghost.yml", &update_request("ghost", "a: 1\n", &"a".repeat(40)))
        .unwrap_err();
    assert_eq!(err.code(), codes::CONFIG_FILE_NOT_FOUND);
}

#[test]
fn test_delete_config_file() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.store.initialize("prod/user-svc.yml", "user-svc", TEST_EMAIL).unwrap();

    env.store
        .delete(
            "prod/user-svc.yml",
            &DeleteRequest { message: "Remove user-svc".to_string(), email: TEST_EMAIL.to_string() },
        )
        .unwrap();

    let err = env.store.read("prod/user-svc.yml").unwrap_err();
    assert_eq!(err.code(), codes::CONFIG_FILE_NOT_FOUND);

    // The removal commit is part of namespace history.
    let events = env.store.namespace_events("prod").unwrap();
    assert_eq!(events.commits[0].commit_message.as_deref(), Some("Remove user-svc"));
}

#[test]
fn test_commit_changes_for_root_commit_diffs_empty_tree() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.store.initialize("prod/user-svc.yml", "user-svc", TEST_EMAIL).unwrap();

    let commit_id = env.store.latest_commit_id("prod/user-svc.yml").unwrap();
    let changes = env.store.commit_changes(&commit_id, "prod").unwrap();

    assert_eq!(changes.commit_id, commit_id);
    assert!(changes.commit_message.contains("First commit"));
    // Metadata headers stripped, hunk headers and added lines kept.
    assert!(changes.changes.contains("@@"));
    assert!(changes.changes.contains("+server:"));
    assert!(!changes.changes.contains("diff --git"));
    assert!(!changes.changes.contains("new file mode"));
}

#[test]
fn test_commit_changes_between_revisions() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.store.initialize("prod/user-svc.yml", "user-svc", TEST_EMAIL).unwrap();

    let base = env.store.latest_commit_id("prod/user-svc.yml").unwrap();
    let second = env
        .store
        .update("prod/user-svc.yml", &update_request("user-svc", "server:\n  port: 9090\n", &base))
        .unwrap();

    let changes = env.store.commit_changes(&second, "prod").unwrap();
    assert!(changes.changes.contains("+  port: 9090"));
    assert!(!changes.changes.contains("index "));
}

#[test]
fn test_history_is_bounded_and_newest_first() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.store.initialize("prod/user-svc.yml", "user-svc", TEST_EMAIL).unwrap();

    let mut last = env.store.latest_commit_id("prod/user-svc.yml").unwrap();
    for round in 0..5 {
        last = env
            .store
            .update(
                "prod/user-svc.yml",
                &update_request("user-svc", &format!("round: {}\n", round), &last),
            )
            .unwrap();
    }

    let history = env.store.history("prod/user-svc.yml").unwrap();
    assert_eq!(history.commits.len(), 6);
    assert_eq!(history.commits[0].commit_id, last);
    assert_eq!(history.file_path, "prod/user-svc.yml");
}

#[test]
fn test_directory_and_namespace_listing() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.store.create_namespace("staging").unwrap();
    env.store.initialize("prod/user-svc.yml", "user-svc", TEST_EMAIL).unwrap();
    env.store.initialize("prod/api/gateway.yml", "gateway", TEST_EMAIL).unwrap();

    assert_eq!(env.store.list_namespaces().unwrap(), vec!["prod", "staging"]);

    // Root listing: .git and .vault are hidden, subdirectory suffixed.
    let root = env.store.list_directory("prod", "").unwrap();
    assert_eq!(root, vec!["api/", "user-svc"]);

    let api = env.store.list_directory("prod", "api").unwrap();
    assert_eq!(api, vec!["gateway"]);

    let err = env.store.list_directory("ghost", "").unwrap_err();
    assert_eq!(err.code(), codes::NAMESPACE_NOT_FOUND);
}

#[test]
fn test_reserved_and_invalid_namespaces_rejected() {
    let env = TestEnv::new();
    for name in ["system", "Admin", "DEFAULT", "root"] {
        let err = env.store.create_namespace(name).unwrap_err();
        assert_eq!(err.code(), codes::INVALID_NAMESPACE, "{name} should be reserved");
    }
    assert!(env.store.create_namespace("bad name").is_err());
    assert!(env.store.create_namespace(&"a".repeat(51)).is_err());
    assert!(env.store.create_namespace(&"a".repeat(50)).is_ok());
}

#[test]
fn test_delete_namespace_clears_state_and_cache() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.store.initialize("prod/user-svc.yml", "user-svc", TEST_EMAIL).unwrap();

    // Warm the caches.
    env.store.read("prod/user-svc.yml").unwrap();
    env.store.latest_commit_id("prod/user-svc.yml").unwrap();
    assert!(env.cache.config_content.get("prod/user-svc.yml").is_some());

    env.store.delete_namespace("prod").unwrap();

    assert!(env.cache.config_content.get("prod/user-svc.yml").is_none());
    assert!(env.cache.latest_commit.get("prod/user-svc.yml").is_none());
    assert!(!env.store.list_namespaces().unwrap().contains(&"prod".to_string()));

    let err = env.store.read("prod/user-svc.yml").unwrap_err();
    assert_eq!(err.code(), codes::NAMESPACE_NOT_FOUND);
}

#[test]
fn test_update_records_notification() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.store.initialize("prod/user-svc.yml", "user-svc", TEST_EMAIL).unwrap();

    let base = env.store.latest_commit_id("prod/user-svc.yml").unwrap();
    let commit = env
        .store
        .update("prod/user-svc.yml", &update_request("user-svc", "a: 1\n", &base))
        .unwrap();

    // No refresh URL configured: the notification completes immediately.
    let notifications = env.store.namespace_notifications("prod").unwrap();
    assert_eq!(notifications.total_notifications, 1);
    assert_eq!(notifications.notifications[0].id, commit);
    assert_eq!(notifications.notifications[0].status, NotificationStatus::Success);

    let err = env.store.namespace_notifications("ghost").unwrap_err();
    assert_eq!(err.code(), codes::NAMESPACE_NOT_FOUND);
}

#[test]
fn test_read_is_cached_until_write() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.store.initialize("prod/user-svc.yml", "user-svc", TEST_EMAIL).unwrap();

    let first = env.store.read("prod/user-svc.yml").unwrap();
    assert!(env.cache.config_content.get("prod/user-svc.yml").is_some());

    let base = env.store.latest_commit_id("prod/user-svc.yml").unwrap();
    env.store
        .update("prod/user-svc.yml", &update_request("user-svc", "fresh: true\n", &base))
        .unwrap();

    // A read following the write observes the write.
    let second = env.store.read("prod/user-svc.yml").unwrap();
    assert_ne!(first, second);
    assert!(second.contains("fresh: true"));
}
