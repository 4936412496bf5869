//! Temp file and output lifecycle under failure.

use std::time::Duration;

use casefile::config::Config;
use casefile::record::UploadSlot;
use casefile::{ArtifactError, CaseFileEngine, MergeOrchestrator, Slot};
use uuid::Uuid;

use crate::common::{leftover_artifacts, storage_root, write_bytes, write_image, write_pdf};

#[tokio::test]
async fn test_failed_final_write_leaves_nothing_behind() {
    let root = storage_root();
    write_pdf(root.path(), "a.pdf", &[(100.0, 100.0)]);
    write_image(root.path(), "b.png", 12, 12);

    // A non-empty directory where the output should go makes the rename fail.
    let blocked = root.path().join("out.pdf");
    std::fs::create_dir(&blocked).unwrap();
    write_bytes(&blocked, "keep", b"x");

    let slots = [
        UploadSlot::new(Slot::Disposition, Some("a.pdf")),
        UploadSlot::new(Slot::Itinerary, Some("b.png")),
    ];
    let err = MergeOrchestrator::new(Config::new(root.path()))
        .merge(1, slots, "out.pdf")
        .await
        .unwrap_err();

    assert!(matches!(err.cause(), ArtifactError::Write { .. }));
    assert_eq!(err.exit_code(), 5);
    assert!(leftover_artifacts(root.path()).is_empty());
    assert!(blocked.is_dir());
}

#[tokio::test]
async fn test_corrupt_image_leaves_no_temp_files() {
    let root = storage_root();
    write_image(root.path(), "b.png", 12, 12);
    write_bytes(root.path(), "d.jpg", b"\xFF\xD8 not actually a jpeg");

    let slots = [
        UploadSlot::new(Slot::Itinerary, Some("b.png")),
        UploadSlot::new(Slot::Documentation, Some("d.jpg")),
        UploadSlot::new(Slot::BoardingPass, Some("b.png")),
    ];
    let err = MergeOrchestrator::new(Config::new(root.path()))
        .merge(2, slots, "out.pdf")
        .await
        .unwrap_err();

    assert_eq!(err.slot, Some(Slot::Documentation));
    assert!(matches!(err.cause(), ArtifactError::Conversion { .. }));
    assert!(!root.path().join("out.pdf").exists());
    assert!(leftover_artifacts(root.path()).is_empty());
}

#[tokio::test]
async fn test_invalid_output_name_touches_nothing() {
    let root = storage_root();
    write_image(root.path(), "b.png", 12, 12);

    let err = MergeOrchestrator::new(Config::new(root.path()))
        .merge(3, [UploadSlot::new(Slot::Itinerary, Some("b.png"))], "../escape.pdf")
        .await
        .unwrap_err();

    assert!(matches!(err.cause(), ArtifactError::InvalidOutputName { .. }));
    assert!(leftover_artifacts(root.path()).is_empty());
}

#[tokio::test]
async fn test_cancelled_caller_still_cleans_up() {
    let root = storage_root();
    write_pdf(root.path(), "a.pdf", &[(100.0, 100.0)]);
    for i in 0..4 {
        write_image(root.path(), &format!("photo-{i}.png"), 400, 400);
    }

    let slots = vec![
        UploadSlot::new(Slot::Disposition, Some("a.pdf")),
        UploadSlot::new(Slot::Itinerary, Some("photo-0.png")),
        UploadSlot::new(Slot::Material, Some("photo-1.png")),
        UploadSlot::new(Slot::Documentation, Some("photo-2.png")),
        UploadSlot::new(Slot::Report, Some("photo-3.png")),
    ];

    let orchestrator = MergeOrchestrator::new(Config::new(root.path()));
    let merge = orchestrator.merge(4, slots, "out.pdf");
    // Drop the future almost immediately; the blocking job keeps running.
    let _ = tokio::time::timeout(Duration::from_millis(1), merge).await;

    let output = root.path().join("out.pdf");
    for _ in 0..200 {
        if output.exists() && leftover_artifacts(root.path()).is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert!(output.is_file());
    assert!(leftover_artifacts(root.path()).is_empty());
}

#[test]
fn test_sweep_removes_orphans_from_killed_jobs() {
    let root = storage_root();
    let job = Uuid::new_v4().simple();
    let temp = write_bytes(root.path(), &format!("temp-{job}-0-b.png.pdf"), b"%PDF");
    let staging = write_bytes(
        root.path(),
        &format!(".merged-1-x-1.pdf.{}.partial", Uuid::new_v4().simple()),
        b"%PDF",
    );
    write_pdf(root.path(), "a.pdf", &[(100.0, 100.0)]);
    write_pdf(root.path(), "temp-laporan.pdf", &[(100.0, 100.0)]);

    let mut config = Config::new(root.path());
    config.stale_temp_age = Duration::ZERO;

    let removed = CaseFileEngine::new(config).sweep_stale().unwrap();

    assert_eq!(removed, 2);
    assert!(!temp.exists());
    assert!(!staging.exists());
    assert!(root.path().join("a.pdf").is_file());
    assert!(root.path().join("temp-laporan.pdf").is_file());
}
