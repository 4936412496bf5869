//! Availability reports for whole records.

use casefile::availability::ExclusionReason;
use casefile::{AvailabilityInspector, CaseRecord, Slot};

use crate::common::{example_record, storage_root, write_bytes};

#[test]
fn test_example_record_report() {
    let root = storage_root();
    let record = example_record(root.path());

    let report = AvailabilityInspector::new(root.path()).inspect(&record);

    assert_eq!(report.total, 7);
    assert_eq!(report.available, 4);
    assert_eq!(report.missing, 3);
    assert!(report.can_merge);

    let files: Vec<(Slot, &str)> = report
        .files
        .iter()
        .map(|f| (f.slot_name, f.path.as_str()))
        .collect();
    assert_eq!(
        files,
        vec![
            (Slot::Disposition, "a.pdf"),
            (Slot::Itinerary, "b.png"),
            (Slot::Documentation, "d.jpg"),
            (Slot::BoardingPass, "g.pdf"),
        ]
    );

    let report_slot = report
        .excluded
        .iter()
        .find(|e| e.slot_name == Slot::Report)
        .unwrap();
    assert_eq!(report_slot.reason, ExclusionReason::NotFound);
}

#[test]
fn test_inspection_is_repeatable() {
    let root = storage_root();
    let record = example_record(root.path());
    let inspector = AvailabilityInspector::new(root.path());

    assert_eq!(inspector.inspect(&record), inspector.inspect(&record));
}

#[test]
fn test_inspection_sees_new_uploads() {
    let root = storage_root();
    let record = CaseRecord::new(1).with(Slot::Report, "laporan.pdf");
    let inspector = AvailabilityInspector::new(root.path());

    assert!(!inspector.inspect(&record).can_merge);

    write_bytes(root.path(), "laporan.pdf", b"%PDF-1.5");
    assert!(inspector.inspect(&record).can_merge);
}

#[test]
fn test_gif_and_escaping_references_are_excluded() {
    let root = storage_root();
    write_bytes(root.path(), "anim.gif", b"GIF89a");

    let record = CaseRecord::new(2)
        .with(Slot::Material, "anim.gif")
        .with(Slot::Report, "../../etc/passwd.pdf");
    let report = AvailabilityInspector::new(root.path()).inspect(&record);

    assert_eq!(report.available, 0);
    assert!(!report.can_merge);

    let reasons: Vec<(Slot, ExclusionReason)> = report
        .excluded
        .iter()
        .filter(|e| e.reason != ExclusionReason::NotProvided)
        .map(|e| (e.slot_name, e.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (Slot::Material, ExclusionReason::UnsupportedFormat),
            (Slot::Report, ExclusionReason::NotFound),
        ]
    );
}

#[test]
fn test_report_json_shape() {
    let root = storage_root();
    let record = example_record(root.path());

    let json = serde_json::to_value(AvailabilityInspector::new(root.path()).inspect(&record)).unwrap();

    assert_eq!(json["total"], 7);
    assert_eq!(json["available"], 4);
    assert_eq!(json["missing"], 3);
    assert_eq!(json["canMerge"], true);
    assert_eq!(json["files"][1]["slotName"], "Itinerary");
}
