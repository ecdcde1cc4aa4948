use reviewdesk_core::{
    RepoError, ReviewService, ReviewStatus, StorageEngine, UploadedFile, ValidationError,
};
use uuid::Uuid;

fn files() -> Vec<UploadedFile> {
    vec![
        UploadedFile::new("cat.png", "1700000000000-aaaa.png"),
        UploadedFile::new("dog.jpg", "1700000000001-bbbb.jpg"),
    ]
}

#[test]
fn upload_creates_batch_and_pending_assets() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let service = ReviewService::with_engine(&engine);

    let receipt = service.upload_batch(&files()).unwrap();
    assert!(Uuid::parse_str(&receipt.batch_id).is_ok());
    assert_eq!(receipt.review_url, format!("/review/{}", receipt.batch_id));
    assert_eq!(receipt.assets.len(), 2);
    assert_eq!(receipt.assets[0].filename, "cat.png");
    assert_eq!(receipt.assets[1].filepath, "1700000000001-bbbb.jpg");
    assert!(receipt
        .assets
        .iter()
        .all(|asset| asset.status == ReviewStatus::Pending && asset.batch_id == receipt.batch_id));

    let view = service.batch_view(&receipt.batch_id).unwrap().unwrap();
    assert_eq!(view.batch.id, receipt.batch_id);
    assert_eq!(view.assets, receipt.assets);
}

#[test]
fn empty_upload_is_rejected() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let service = ReviewService::with_engine(&engine);

    let err = service.upload_batch(&[]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyUpload)
    ));
}

#[test]
fn invalid_file_leaves_no_partial_upload() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let service = ReviewService::with_engine(&engine);

    let err = service
        .upload_batch(&[
            UploadedFile::new("cat.png", "1700000000000-aaaa.png"),
            UploadedFile::new("dog.jpg", "  "),
        ])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyField("filepath"))
    ));

    for table in ["batches", "assets"] {
        let count = engine
            .query(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
                row.get::<_, i64>(0)
            })
            .unwrap();
        assert_eq!(count, vec![0], "{table} should be empty");
    }
}

#[test]
fn missing_views_are_none() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let service = ReviewService::with_engine(&engine);

    assert!(service.batch_view("nonexistent").unwrap().is_none());
    assert!(service.asset_view("nonexistent").unwrap().is_none());
}

#[test]
fn asset_view_includes_trimmed_comments() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let service = ReviewService::with_engine(&engine);
    let receipt = service.upload_batch(&files()).unwrap();
    let asset_id = receipt.assets[0].id.as_str();

    let comment = service
        .add_comment(asset_id, "  alice ", " looks good\n")
        .unwrap();
    assert_eq!(comment.author, "alice");
    assert_eq!(comment.content, "looks good");

    let view = service.asset_view(asset_id).unwrap().unwrap();
    assert_eq!(view.asset.id, asset_id);
    assert_eq!(view.comments, vec![comment]);
}

#[test]
fn comment_on_missing_asset_is_not_found() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let service = ReviewService::with_engine(&engine);

    let err = service.add_comment("ghost", "alice", "hi").unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound { entity: "asset", ref id } if id == "ghost"
    ));
}

#[test]
fn summary_tracks_status_changes() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let service = ReviewService::with_engine(&engine);
    let receipt = service
        .upload_batch(&[
            UploadedFile::new("a.png", "a.png"),
            UploadedFile::new("b.png", "b.png"),
            UploadedFile::new("c.png", "c.png"),
        ])
        .unwrap();

    service
        .set_status(&receipt.assets[0].id, "approved")
        .unwrap();
    service
        .set_status(&receipt.assets[1].id, "rejected")
        .unwrap();

    let summary = service.review_summary(&receipt.batch_id).unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.approved, 1);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.pending, 1);
    assert!(!summary.is_complete());

    service
        .set_status(&receipt.assets[2].id, "approved")
        .unwrap();
    assert!(service
        .review_summary(&receipt.batch_id)
        .unwrap()
        .is_complete());
}

#[test]
fn batch_view_serializes_flat() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let service = ReviewService::with_engine(&engine);
    let receipt = service.upload_batch(&files()).unwrap();

    let view = service.batch_view(&receipt.batch_id).unwrap().unwrap();
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["id"], receipt.batch_id.as_str());
    assert!(json["created_at"].is_i64());
    assert_eq!(json["assets"][0]["status"], "pending");
}
