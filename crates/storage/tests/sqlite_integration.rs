use chrono::NaiveDate;
use storage::mapping::PROGRESS_KEY;
use storage::repository::{ProgressRepository, Storage, StorageError};
use storage::sqlite::SqliteRepository;
use tarteel_core::model::{Portion, PortionRange, Progress, ReviewScore, SurahNumber};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn build_progress() -> Progress {
    let surah = SurahNumber::new(2).unwrap();
    Progress::from_persisted(
        surah,
        10,
        vec![Portion::from_persisted(
            PortionRange::new(surah, 0, 5).unwrap(),
            1,
            date(2024, 1, 5),
            ReviewScore::Clean,
        )],
        Some(PortionRange::new(surah, 5, 10).unwrap()),
        date(2024, 1, 1),
    )
}

#[tokio::test]
async fn sqlite_roundtrip_persists_progress() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.get_progress().await.unwrap().is_none());

    let progress = build_progress();
    repo.save_progress(&progress).await.unwrap();
    let fetched = repo.get_progress().await.expect("fetch");
    assert_eq!(fetched, Some(progress.clone()));

    // saving again replaces the single record
    let graduated = progress.graduate_pending(date(2024, 1, 2));
    repo.save_progress(&graduated).await.unwrap();
    let fetched = repo.get_progress().await.unwrap().unwrap();
    assert_eq!(fetched.approved_portions().len(), 2);
    assert!(fetched.pending_sabaqi().is_none());

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_records")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(applied, 1);
}

#[tokio::test]
async fn sqlite_corrupt_record_is_a_serialization_error() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    sqlx::query("INSERT INTO kv_records (key, value, updated_at) VALUES (?1, ?2, ?3)")
        .bind(PROGRESS_KEY)
        .bind("{ not json")
        .bind("2024-01-01T00:00:00Z")
        .execute(repo.pool())
        .await
        .unwrap();

    let err = repo.get_progress().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn storage_sqlite_wires_progress_repository() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    let progress = build_progress();
    storage.progress.save_progress(&progress).await.unwrap();
    assert_eq!(storage.progress.get_progress().await.unwrap(), Some(progress));
}
