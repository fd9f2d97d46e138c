use super::*;

#[tokio::test]
async fn test_create_reuses_running_task_with_same_custom_id() {
    let (uploader, provider) = create_test_uploader();
    let first = uploader.create(sample_options().custom_upload_id("video-1"));
    first.start().await.unwrap();

    let second = uploader.create(sample_options().custom_upload_id("video-1"));
    assert!(second.same_task(&first), "running custom id must be deduplicated");

    second.start().await.unwrap();
    assert_eq!(provider.starts(), 1);
}

#[tokio::test]
async fn test_create_without_custom_id_never_dedups() {
    let (uploader, _provider) = create_test_uploader();
    let first = uploader.create(sample_options());
    first.start().await.unwrap();

    let second = uploader.create(sample_options());
    assert!(!second.same_task(&first));
}

#[tokio::test]
async fn test_create_after_terminal_builds_new_task() {
    let (uploader, _provider) = create_test_uploader();
    let first = uploader.create(sample_options().custom_upload_id("video-1"));
    let outcome = first.start().await.unwrap();
    uploader.dispatch(completed("video-1", 200, "ok"));
    outcome.await.unwrap();

    let second = uploader.create(sample_options().custom_upload_id("video-1"));
    assert!(!second.same_task(&first));
    assert_eq!(second.status(), UploadStatus::Pending);
}

#[tokio::test]
async fn test_start_adopts_running_native_upload() {
    let (uploader, provider) = create_test_uploader();
    provider.add_native("video-1", NativeUploadState::Running);

    let upload = uploader.create(sample_options().custom_upload_id("video-1"));
    let changes = record_changes(&upload);
    let outcome = upload.start().await.unwrap();

    assert_eq!(provider.starts(), 0, "adoption must skip the native start");
    assert_eq!(provider.lists(), 1);
    assert_eq!(upload.id(), Some(UploadId::from("video-1")));
    assert!(upload.is_running());
    assert!(uploader.registry().has(&"video-1".into()));
    assert_eq!(changes.lock().unwrap()[0].status, UploadStatus::Running);

    uploader.dispatch(completed("video-1", 200, "ok"));
    assert!(outcome.await.unwrap().is_success());
}

#[tokio::test]
async fn test_start_adopts_pending_native_upload() {
    let (uploader, provider) = create_test_uploader();
    provider.add_native("video-1", NativeUploadState::Pending);

    let upload = uploader.create(sample_options().custom_upload_id("video-1"));
    upload.start().await.unwrap();
    assert_eq!(upload.status(), UploadStatus::Pending);

    uploader.dispatch(progress("video-1", 3.0, 3, 100));
    assert_eq!(upload.status(), UploadStatus::Running);
}

#[tokio::test]
async fn test_start_adopting_completed_native_upload_resolves_immediately() {
    let (uploader, provider) = create_test_uploader();
    provider.add_native("video-1", NativeUploadState::Completed);

    let upload = uploader.create(sample_options().custom_upload_id("video-1"));
    let outcome = upload.start().await.unwrap();

    assert_eq!(
        outcome.try_result(),
        Some(Ok(UploadResult::bare(UploadStatus::Completed)))
    );
    assert_eq!(provider.starts(), 0);
    assert!(!uploader.registry().has(&"video-1".into()));
    assert_eq!(uploader.events().listener_count(EventKind::Completed), 0);
}

#[tokio::test]
async fn test_start_does_not_adopt_failed_or_cancelled_native_upload() {
    for state in [NativeUploadState::Error, NativeUploadState::Cancelled] {
        let (uploader, provider) = create_test_uploader();
        provider.add_native("video-1", state);

        let upload = uploader.create(sample_options().custom_upload_id("video-1"));
        upload.start().await.unwrap();

        assert_eq!(provider.starts(), 1, "{:?} upload must be restarted", state);
        assert!(upload.is_running());
    }
}

#[tokio::test]
async fn test_adoption_ignores_other_ids() {
    let (uploader, provider) = create_test_uploader();
    provider.add_native("other", NativeUploadState::Running);

    let upload = uploader.create(sample_options().custom_upload_id("video-1"));
    upload.start().await.unwrap();
    assert_eq!(provider.starts(), 1);
}

#[tokio::test]
async fn test_listing_failure_fails_start() {
    let (uploader, provider) = create_test_uploader();
    provider.set_fail_list(Error::native("listing unavailable"));

    let upload = uploader.create(sample_options().custom_upload_id("video-1"));
    assert_eq!(
        upload.start().await.unwrap_err(),
        Error::native("listing unavailable")
    );
    assert_eq!(provider.starts(), 0);

    // Without a custom id the listing is never consulted
    let upload = uploader.create(sample_options());
    upload.start().await.unwrap();
    assert_eq!(provider.lists(), 1);
}

#[tokio::test]
async fn test_resume_finds_native_upload() {
    let (uploader, provider) = create_test_uploader();
    provider.add_native("u7", NativeUploadState::Running);

    let upload = uploader.resume("u7").await.unwrap().expect("u7 is known natively");
    assert_eq!(upload.id(), Some(UploadId::from("u7")));
    assert_eq!(upload.status(), UploadStatus::Running);
    assert_eq!(upload.path(), "");
    assert!(uploader.registry().has(&"u7".into()));

    let again = uploader.resume("u7").await.unwrap().unwrap();
    assert!(again.same_task(&upload));
    assert_eq!(provider.lists(), 1, "registered uploads resume without listing");

    let outcome = upload.outcome().unwrap();
    uploader.dispatch(failed("u7", "server closed connection"));
    assert_eq!(outcome.await.unwrap().status, UploadStatus::Error);
}

#[tokio::test]
async fn test_resume_unknown_id_returns_none() {
    let (uploader, _provider) = create_test_uploader();
    assert!(uploader.resume("missing").await.unwrap().is_none());
    assert!(uploader.registry().is_empty());
}

#[tokio::test]
async fn test_resume_maps_unknown_native_state_to_pending() {
    let (uploader, provider) = create_test_uploader();
    provider.add_native("u8", NativeUploadState::Unknown);

    let upload = uploader.resume("u8").await.unwrap().unwrap();
    assert_eq!(upload.status(), UploadStatus::Pending);

    uploader.dispatch(progress("u8", 12.0, 12, 100));
    assert_eq!(upload.status(), UploadStatus::Running);
}

#[tokio::test]
async fn test_resume_finished_native_upload_is_resolved_and_untracked() {
    let (uploader, provider) = create_test_uploader();
    provider.add_native("u9", NativeUploadState::Cancelled);

    let upload = uploader.resume("u9").await.unwrap().unwrap();
    assert!(upload.is_terminal());
    assert_eq!(
        upload.outcome().unwrap().await,
        Ok(UploadResult::bare(UploadStatus::Cancelled))
    );
    assert!(!uploader.registry().has(&"u9".into()));
}

#[tokio::test]
async fn test_resume_propagates_listing_failure() {
    let (uploader, provider) = create_test_uploader();
    provider.set_fail_list(Error::native("listing unavailable"));
    assert!(uploader.resume("u1").await.is_err());
}

#[tokio::test]
async fn test_get_all_returns_live_uploads_by_id() {
    let (uploader, provider) = create_test_uploader();
    provider.push_next_id("b");
    provider.push_next_id("a");
    provider.push_next_id("c");

    let b = uploader.create(sample_options());
    let a = uploader.create(sample_options());
    let c = uploader.create(sample_options());
    for upload in [&b, &a, &c] {
        upload.start().await.unwrap();
    }
    uploader.dispatch(completed("c", 200, "ok"));

    let ids: Vec<_> = uploader
        .get_all()
        .iter()
        .map(|u| u.id().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}
