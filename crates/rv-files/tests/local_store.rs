//! Blob store against the local filesystem backend.

use pretty_assertions::assert_eq;
use rv_config::{StorageBackend, StorageConfig};
use rv_files::{FileStore, content_key};

#[tokio::test]
async fn local_store_writes_sharded_blob_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::local(dir.path()).unwrap();

    let stored = store.store("report.png", b"image bytes").await.unwrap();
    let key = content_key(b"image bytes");
    assert_eq!(stored.key, key);

    let on_disk = dir.path().join("blobs").join(&key[..2]).join(&key);
    assert!(on_disk.exists(), "expected {}", on_disk.display());
    assert_eq!(std::fs::read(&on_disk).unwrap(), b"image bytes");

    assert_eq!(store.read(&key).await.unwrap(), b"image bytes");
}

#[tokio::test]
async fn local_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let key = {
        let store = FileStore::local(dir.path()).unwrap();
        store.store("a.txt", b"persisted").await.unwrap().key
    };

    let reopened = FileStore::local(dir.path()).unwrap();
    assert!(reopened.exists(&key).await.unwrap());
    let again = reopened.store("b.txt", b"persisted").await.unwrap();
    assert!(!again.created);
}

#[tokio::test]
async fn from_config_creates_missing_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("files");
    let config = StorageConfig {
        backend: StorageBackend::Local,
        root: root.to_string_lossy().into_owned(),
    };

    let store = FileStore::from_config(&config).unwrap();
    store.store("x.bin", &[0, 1, 2]).await.unwrap();
    assert!(root.join("blobs").is_dir());
}
