//! Submission payload and read-back query parsing.

mod common;

use common::TestDirs;
use tabfuse_core::task::{FieldFilter, TaskStatus};
use tabfuse_exec::{parse_query, parse_task_request, ExecError, StatusEvent, TaskService, ValidationError};

#[test]
fn test_yaml_request_round_trips_into_a_task() {
    let yaml = r#"
taskName: cars
dataSources:
  - selectedSource: a.csv
    selectedFields: [id, make, price]
    fieldFilters:
      price:
        from: "25000"
        to: ""
      make:
        values: [Audi]
  - selectedSource: b.csv
"#;
    let req = parse_task_request(yaml).unwrap();
    req.validate().unwrap();
    assert_eq!(req.data_sources.len(), 2);
    let a = &req.data_sources[0];
    assert_eq!(a.selected_fields, vec!["id", "make", "price"]);
    assert_eq!(a.field_filters["price"], FieldFilter::range(Some(25000.0), None));
    assert_eq!(a.field_filters["make"], FieldFilter::values(["Audi"]));
}

#[test]
fn test_filter_without_bounds_or_values_is_rejected() {
    let json = r#"{"taskName": "t", "dataSources": [
        {"selectedSource": "a.csv", "fieldFilters": {"price": {}}}
    ]}"#;
    assert!(matches!(parse_task_request(json), Err(ExecError::Payload(_))));
}

#[test]
fn test_query_payload() {
    let q = parse_query(r#"{"fields": ["make"], "fieldFilters": {"make": {"values": ["bmw"]}}}"#).unwrap();
    assert_eq!(q.fields, vec!["make"]);
    assert!(q.task_id.is_none());
}

#[test]
fn test_status_event_wire_format() {
    let ev = StatusEvent::new(tabfuse_core::id::TaskId::new(7), TaskStatus::MergingData);
    let v = serde_json::to_value(&ev).unwrap();
    assert_eq!(v["taskId"], 7);
    assert_eq!(v["status"], "merging_data");
    assert!(v.get("reason").is_none());
}

#[tokio::test]
async fn test_rejected_submissions_never_reach_the_repository() {
    let dirs = TestDirs::new("rejected").with_cars();
    let svc = TaskService::from_config(&dirs.config()).unwrap();

    let req = parse_task_request("taskName: t\ndataSources: []\n").unwrap();
    match svc.submit(req) {
        Err(ExecError::Validation(ValidationError::NoDataSources)) => {}
        other => panic!("unexpected: {other:?}"),
    }
    assert!(svc.list_tasks(None).unwrap().is_empty());
    svc.shutdown().await.unwrap();
}
