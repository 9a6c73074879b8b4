//! End-to-end tests for the pull-client resolver.

mod common;

use std::collections::BTreeMap;

use common::{update_request, TestEnv, TEST_EMAIL};
use gitvault::errors::codes;
use serde_yaml::Value;

fn secrets(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn seed_file(env: &TestEnv, file_path: &str, app_name: &str, content: &str) {
    env.store.initialize(file_path, app_name, TEST_EMAIL).unwrap();
    let base = env.store.latest_commit_id(file_path).unwrap();
    env.store.update(file_path, &update_request(app_name, content, &base)).unwrap();
}

fn property<'a>(resolved: &'a gitvault::resolver::ResolvedConfig, key: &str) -> Option<&'a Value> {
    resolved.property_sources[0].source.get(&Value::String(key.to_string()))
}

#[test]
fn test_resolves_flattened_application_config() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    seed_file(&env, "prod/user-svc.yml", "user-svc", "server:\n  port: 9090\ndb:\n  host: pg\n");

    let resolved = env.resolver.resolve("user-svc", "default", "prod").unwrap();

    assert_eq!(resolved.name, "user-svc");
    assert_eq!(resolved.profiles, vec!["default"]);
    assert_eq!(resolved.property_sources.len(), 1);
    assert_eq!(resolved.property_sources[0].name, "merged-user-svc-default");
    assert_eq!(property(&resolved, "server.port"), Some(&Value::Number(9090.into())));
    assert_eq!(property(&resolved, "db.host"), Some(&Value::String("pg".into())));

    // Version is the latest commit of the application base file.
    let expected_version = env.store.latest_commit_id("prod/user-svc.yml").unwrap();
    assert_eq!(resolved.version.as_deref(), Some(expected_version.as_str()));
}

#[test]
fn test_substitutes_vault_secrets() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.vault
        .update_vault("prod", &secrets(&[("db.password", "s3cret")]), TEST_EMAIL, "Seed vault")
        .unwrap();
    seed_file(&env, "prod/user-svc.yml", "user-svc", "db:\n  password: stub\n  host: pg\n");

    let resolved = env.resolver.resolve("user-svc", "default", "prod").unwrap();

    assert_eq!(property(&resolved, "db.password"), Some(&Value::String("s3cret".into())));
    assert_eq!(property(&resolved, "db.host"), Some(&Value::String("pg".into())));
}

#[test]
fn test_profile_overlays_apply_in_order() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    seed_file(&env, "prod/user-svc.yml", "user-svc", "server:\n  port: 8080\nfeature: base\n");
    seed_file(&env, "prod/user-svc-dev.yml", "user-svc-dev", "feature: dev\nextra: dev-only\n");
    seed_file(&env, "prod/user-svc-uat.yml", "user-svc-uat", "feature: uat\n");

    // Later profiles win; `default` segments are skipped entirely.
    let resolved = env.resolver.resolve("user-svc", "default,dev,uat", "prod").unwrap();

    assert_eq!(resolved.property_sources[0].name, "merged-user-svc-default,dev,uat");
    assert_eq!(property(&resolved, "feature"), Some(&Value::String("uat".into())));
    assert_eq!(property(&resolved, "extra"), Some(&Value::String("dev-only".into())));
    assert_eq!(property(&resolved, "server.port"), Some(&Value::Number(8080.into())));
}

#[test]
fn test_namespace_wide_base_is_lowest_precedence() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    seed_file(&env, "prod/application.yml", "application", "shared: from-base\ncommon: true\n");
    seed_file(&env, "prod/user-svc.yml", "user-svc", "shared: from-app\n");

    let resolved = env.resolver.resolve("user-svc", "default", "prod").unwrap();

    assert_eq!(property(&resolved, "shared"), Some(&Value::String("from-app".into())));
    assert_eq!(property(&resolved, "common"), Some(&Value::Bool(true)));
}

#[test]
fn test_label_subpath_and_missing_label() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    env.store.create_namespace("main").unwrap();
    seed_file(&env, "prod/api/gateway.yml", "gateway", "tier: api\n");
    seed_file(&env, "main/gateway.yml", "gateway", "tier: main\n");

    let nested = env.resolver.resolve("gateway", "default", "prod/api").unwrap();
    assert_eq!(property(&nested, "tier"), Some(&Value::String("api".into())));
    assert_eq!(nested.label.as_deref(), Some("prod/api"));

    // Empty label falls back to the `main` namespace.
    let defaulted = env.resolver.resolve("gateway", "default", "").unwrap();
    assert_eq!(property(&defaulted, "tier"), Some(&Value::String("main".into())));
    assert_eq!(defaulted.label, None);
}

#[test]
fn test_no_sources_is_not_found() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();

    let err = env.resolver.resolve("ghost-app", "default", "prod").unwrap_err();
    assert_eq!(err.code(), codes::CONFIG_FILE_NOT_FOUND);
    assert!(err.to_string().contains("prod/ghost-app.yml"));
}

#[test]
fn test_missing_profile_overlay_is_skipped() {
    let env = TestEnv::new();
    env.store.create_namespace("prod").unwrap();
    seed_file(&env, "prod/user-svc.yml", "user-svc", "server:\n  port: 8080\n");

    // No user-svc-dev.yml exists; the overlay is silently skipped.
    let resolved = env.resolver.resolve("user-svc", "dev", "prod").unwrap();
    assert_eq!(property(&resolved, "server.port"), Some(&Value::Number(8080.into())));
    assert_eq!(resolved.property_sources[0].name, "merged-user-svc-dev");
}

#[test]
fn test_traversal_inputs_rejected() {
    let env = TestEnv::new();
    assert!(env.resolver.resolve("../etc", "default", "prod").is_err());
    assert!(env.resolver.resolve("app", "../dev", "prod").is_err());
    assert!(env.resolver.resolve("app", "default", "../prod").is_err());
    assert!(env.resolver.resolve("", "default", "prod").is_err());
}
