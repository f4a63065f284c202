use showarr::db::Store;

/// A store backed by a throwaway SQLite file.
pub async fn temp_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("showarr-test-{}.db", uuid::Uuid::new_v4()));
    Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to create store")
}
