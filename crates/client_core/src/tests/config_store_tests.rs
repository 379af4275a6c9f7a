use super::*;
use crate::test_support::{Reply, ScriptedApi, JAVA_CPP_CATALOG};
use reqwest::StatusCode;

#[tokio::test]
async fn load_installs_catalog_and_exposes_defaults() {
    let store = ConfigStore::new();
    assert!(store.catalog().await.is_none());
    assert!(store.default_language().await.is_none());

    let api = ScriptedApi::new();
    let catalog = store.load(&api).await.expect("load");
    assert_eq!(catalog.languages().len(), 2);

    let java = store.default_language().await.expect("default language");
    assert_eq!(java.id.as_str(), "java");
    assert_eq!(
        ConfigStore::default_compiler(&java).map(|c| c.id.as_str()),
        Some("javac")
    );

    let cpp = catalog.language("cpp").expect("cpp");
    assert_eq!(
        ConfigStore::default_compiler(cpp).map(|c| c.id.as_str()),
        Some("gcc")
    );
}

#[tokio::test]
async fn unreachable_provider_is_a_load_error() {
    let api = ScriptedApi::new();
    *api.config_reply.lock().await = Reply::Status(StatusCode::BAD_GATEWAY);

    let store = ConfigStore::new();
    let err = store.load(&api).await.expect_err("must fail");
    assert!(matches!(err, ConfigLoadError::Transport(_)), "got {err:?}");
    assert!(store.catalog().await.is_none());
}

#[tokio::test]
async fn malformed_body_is_a_load_error() {
    let api = ScriptedApi::new();
    *api.config_reply.lock().await = Reply::body(r#"{"languages": []}"#);

    let err = ConfigStore::new().load(&api).await.expect_err("must fail");
    assert!(matches!(err, ConfigLoadError::Catalog(_)), "got {err:?}");
}

#[tokio::test]
async fn failed_reload_keeps_previous_catalog() {
    let store = ConfigStore::new();
    let first = store.load_from_str(JAVA_CPP_CATALOG).await.expect("load");

    store
        .load_from_str(r#"{"languages": [{"id": "go", "name": "Go", "compilers": []}]}"#)
        .await
        .expect_err("must fail");

    let current = store.catalog().await.expect("catalog still present");
    assert!(Arc::ptr_eq(&first, &current));
}

#[tokio::test]
async fn reload_replaces_catalog_wholesale() {
    let store = ConfigStore::new();
    let first = store.load_from_str(JAVA_CPP_CATALOG).await.expect("load");

    let second = store.install(CompilerConfigModel::builtin()).await;
    assert!(!Arc::ptr_eq(&first, &second));

    let ids: Vec<_> = store
        .catalog()
        .await
        .expect("catalog")
        .default_language()
        .default_compiler()
        .map(|c| c.id.to_string())
        .into_iter()
        .collect();
    assert_eq!(ids, vec!["javac".to_string()]);
    assert_eq!(first.language("cpp").expect("cpp").compilers.len(), 2);
}
