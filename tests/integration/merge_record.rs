//! End-to-end merges through the engine.

use casefile::candidate::FileFormat;
use casefile::{ArtifactError, CaseFileEngine, CaseRecord, Config, Slot};

use crate::common::{
    EXAMPLE_PAGES, example_record, leftover_artifacts, merged_outputs, page_sizes,
    pages_without_resources, storage_root, write_bytes, write_image, write_pdf,
};

#[tokio::test]
async fn test_example_record_merges_five_pages_in_slot_order() {
    let root = storage_root();
    let record = example_record(root.path());
    let engine = CaseFileEngine::new(Config::new(root.path()));

    let outcome = engine.merge_with_outcome(&record).await.unwrap();

    assert_eq!(outcome.page_count, 5);
    assert_eq!(page_sizes(&root.path().join(&outcome.file_name)), EXAMPLE_PAGES.to_vec());

    let sources: Vec<(Slot, FileFormat, usize)> = outcome
        .sources
        .iter()
        .map(|s| (s.slot, s.format, s.pages))
        .collect();
    assert_eq!(
        sources,
        vec![
            (Slot::Disposition, FileFormat::Pdf, 2),
            (Slot::Itinerary, FileFormat::Png, 1),
            (Slot::Documentation, FileFormat::Jpeg, 1),
            (Slot::BoardingPass, FileFormat::Pdf, 1),
        ]
    );

    assert_eq!(outcome.temp_files_released, 2);
    assert!(leftover_artifacts(root.path()).is_empty());
}

#[tokio::test]
async fn test_every_merged_page_has_resources() {
    let root = storage_root();
    let record = example_record(root.path());
    let engine = CaseFileEngine::new(Config::new(root.path()));

    let file_name = engine.merge(&record).await.unwrap();

    assert_eq!(pages_without_resources(&root.path().join(file_name)), 0);
}

#[tokio::test]
async fn test_output_name_carries_record_and_label() {
    let root = storage_root();
    let record = example_record(root.path());
    let engine = CaseFileEngine::new(Config::new(root.path()));

    let file_name = engine.merge(&record).await.unwrap();

    assert!(file_name.starts_with("merged-101-Perjalanan_Dinas__Jakarta-"));
    assert!(file_name.ends_with(".pdf"));
    assert_eq!(merged_outputs(root.path()), vec![file_name]);
}

#[tokio::test]
async fn test_unsupported_slot_is_skipped() {
    let root = storage_root();
    write_pdf(root.path(), "a.pdf", &[(100.0, 100.0)]);
    write_bytes(root.path(), "c.gif", b"GIF89a");

    let record = CaseRecord::new(2)
        .with(Slot::Disposition, "a.pdf")
        .with(Slot::Material, "c.gif");
    let outcome = CaseFileEngine::new(Config::new(root.path()))
        .merge_with_outcome(&record)
        .await
        .unwrap();

    assert_eq!(outcome.page_count, 1);
    assert_eq!(outcome.sources.len(), 1);
}

#[tokio::test]
async fn test_image_only_record() {
    let root = storage_root();
    write_image(root.path(), "foto.JPEG", 64, 48);

    let record = CaseRecord::new(3).with(Slot::Documentation, "foto.JPEG");
    let outcome = CaseFileEngine::new(Config::new(root.path()))
        .merge_with_outcome(&record)
        .await
        .unwrap();

    assert_eq!(page_sizes(&root.path().join(&outcome.file_name)), vec![(64.0, 48.0)]);
    assert!(leftover_artifacts(root.path()).is_empty());
}

#[tokio::test]
async fn test_record_without_valid_files_fails_without_output() {
    let root = storage_root();
    write_bytes(root.path(), "c.gif", b"GIF89a");

    let record = CaseRecord::new(4)
        .with(Slot::Material, "c.gif")
        .with(Slot::Report, "missing.pdf");
    let err = CaseFileEngine::new(Config::new(root.path()))
        .merge(&record)
        .await
        .unwrap_err();

    assert!(err.is_no_valid_inputs());
    assert_eq!(err.record_id, 4);
    assert_eq!(err.exit_code(), 4);
    assert!(merged_outputs(root.path()).is_empty());
}

#[tokio::test]
async fn test_corrupt_pdf_aborts_and_names_slot() {
    let root = storage_root();
    write_image(root.path(), "b.png", 10, 10);
    write_bytes(root.path(), "e.pdf", b"%PDF-1.4 truncated");

    let record = CaseRecord::new(5)
        .with(Slot::Itinerary, "b.png")
        .with(Slot::Report, "e.pdf");
    let err = CaseFileEngine::new(Config::new(root.path()))
        .merge(&record)
        .await
        .unwrap_err();

    assert_eq!(err.slot, Some(Slot::Report));
    assert!(matches!(err.cause(), ArtifactError::CorruptPdf { .. }));
    assert!(err.to_string().contains("record 5"));
    assert!(merged_outputs(root.path()).is_empty());
    assert!(leftover_artifacts(root.path()).is_empty());
}

#[tokio::test]
async fn test_concurrent_jobs_on_one_root() {
    let root = storage_root();
    write_image(root.path(), "scan.png", 30, 30);
    write_pdf(root.path(), "a.pdf", &[(100.0, 100.0)]);

    let first = CaseRecord::new(10)
        .with(Slot::Disposition, "a.pdf")
        .with(Slot::Itinerary, "scan.png");
    let second = CaseRecord::new(11)
        .with(Slot::Itinerary, "scan.png")
        .with(Slot::BoardingPass, "a.pdf");

    let engine = CaseFileEngine::new(Config::new(root.path()));
    let (a, b) = tokio::join!(
        engine.merge_with_outcome(&first),
        engine.merge_with_outcome(&second)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.job_id, b.job_id);
    assert_eq!(page_sizes(&root.path().join(&a.file_name)), vec![(100.0, 100.0), (30.0, 30.0)]);
    assert_eq!(page_sizes(&root.path().join(&b.file_name)), vec![(30.0, 30.0), (100.0, 100.0)]);
    assert!(leftover_artifacts(root.path()).is_empty());
}
