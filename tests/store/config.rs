//! Opening a store from `clinicdb.toml`

use crate::common::*;
use tempfile::TempDir;

#[test]
fn open_writes_default_config() {
    let dir = TempDir::new().unwrap();
    let store = DocumentStore::open(dir.path()).unwrap();
    assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    assert_eq!(store.config(), &StoreConfig::default());
}

#[test]
fn open_reads_existing_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[connection]\nbucket = \"clinic\"\n\n[retry]\nmax_retries = 9\n",
    )
    .unwrap();

    let store = DocumentStore::open(dir.path()).unwrap();
    assert_eq!(store.config().connection.bucket, "clinic");
    assert_eq!(store.config().retry.max_retries, 9);
    assert_eq!(store.config().search.index, DEFAULT_SEARCH_INDEX);
}

#[test]
fn open_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[search]\nindex = \"\"\n",
    )
    .unwrap();
    let err = DocumentStore::open(dir.path()).unwrap_err();
    assert!(matches!(err, Error::ValidationFailed(_)));
}
