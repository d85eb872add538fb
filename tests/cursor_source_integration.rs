//! Cursor sources over segment files on disk

mod common;

use common::builders::SegmentBuilder;
use common::{assert_float_eq, write_event_segments, STREAM};
use pipestore::pipeline::nodes::{CursorSourceNode, CursorState};
use pipestore::pipeline::{Pipeline, Terminal, TerminalId};
use pipestore::{ColumnDef, Scalar, ScalarType, SegmentSource, SegmentedStream, Value, ValueKind};

fn event_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("id", ScalarType::Int),
        ColumnDef::new("energy", ScalarType::Float),
    ]
}

fn cursor_pipeline(source: SegmentSource) -> Pipeline {
    let mut pipeline = Pipeline::new();
    pipeline
        .add_node(
            "reader",
            CursorSourceNode::new(STREAM, source, &event_columns()),
        )
        .unwrap();
    pipeline.connect().unwrap();
    pipeline
}

/// Step through one run and collect the `id` of every record served.
fn collect_ids(pipeline: &mut Pipeline) -> Vec<i64> {
    let reader = pipeline.find("reader").unwrap();
    pipeline.open_run().unwrap();
    let mut ids = Vec::new();
    while pipeline.step().unwrap() {
        match &pipeline.graph().terminal(TerminalId::new(reader, 0)).unwrap().value {
            Value::Scalar(Scalar::Int(id)) => ids.push(*id),
            other => panic!("unexpected value {:?}", other),
        }
    }
    pipeline.finish_run().unwrap();
    ids
}

#[test]
fn test_serves_every_record_across_segments() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = write_event_segments(tmp.path(), &[3, 0, 2]);
    let mut pipeline = cursor_pipeline(SegmentSource::Files(paths));

    assert_eq!(collect_ids(&mut pipeline), vec![0, 1, 2, 3, 4]);
    assert_eq!(pipeline.generation(), 5);

    let reader = pipeline.find("reader").unwrap();
    let cursor = pipeline.node(reader).unwrap().as_cursor_source().unwrap();
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert_eq!(cursor.size(), 5);
    assert_eq!(pipeline.graph().output_counter(reader), 5);
}

#[test]
fn test_reopen_replays_same_sequence() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = write_event_segments(tmp.path(), &[2, 2]);
    let mut pipeline = cursor_pipeline(SegmentSource::Files(paths));

    let first = collect_ids(&mut pipeline);
    let second = collect_ids(&mut pipeline);
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
}

#[test]
fn test_exhausted_step_is_repeatable() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = write_event_segments(tmp.path(), &[1]);
    let mut pipeline = cursor_pipeline(SegmentSource::Files(paths));

    pipeline.open_run().unwrap();
    assert!(pipeline.step().unwrap());
    assert!(!pipeline.step().unwrap());
    assert!(!pipeline.step().unwrap());
    assert_eq!(pipeline.finish_run().unwrap().generations, 1);
}

#[test]
fn test_empty_stream_runs_zero_generations() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = write_event_segments(tmp.path(), &[0, 0]);
    let mut pipeline = cursor_pipeline(SegmentSource::Files(paths));

    let stats = pipeline.run().unwrap();
    assert_eq!(stats.generations, 0);
    let reader = pipeline.find("reader").unwrap();
    assert_eq!(pipeline.graph().output_counter(reader), 0);
}

#[test]
fn test_missing_segment_is_resource_error() {
    let tmp = tempfile::tempdir().unwrap();
    let mut paths = write_event_segments(tmp.path(), &[1]);
    paths.push(tmp.path().join("missing.json"));
    let mut pipeline = cursor_pipeline(SegmentSource::Files(paths));

    let err = pipeline.open_run().unwrap_err();
    assert!(err.is_resource());
    assert!(!pipeline.is_running());
}

#[test]
fn test_foreign_segment_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let mut paths = write_event_segments(tmp.path(), &[1]);
    let foreign = tmp.path().join("foreign.json");
    SegmentBuilder::new("other")
        .column("id", ScalarType::Int)
        .column("energy", ScalarType::Float)
        .write_to(&foreign);
    paths.push(foreign);

    let mut pipeline = cursor_pipeline(SegmentSource::Files(paths));
    assert!(pipeline.open_run().unwrap_err().is_config());
}

#[test]
fn test_stream_loads_only_bound_columns() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = write_event_segments(tmp.path(), &[2, 3]);
    let mut stream = SegmentedStream::open(STREAM, &paths).unwrap();
    assert_eq!(stream.entries(), 5);
    assert_eq!(stream.segment_count(), 2);

    stream.set_all_columns_enabled(false);
    // Integer ids widen into a float terminal
    stream.bind("id", 0, ScalarType::Float).unwrap();
    assert!(stream.is_column_enabled("id"));
    assert!(!stream.is_column_enabled("energy"));

    let mut terminals = vec![
        Terminal::new("id", ValueKind::Scalar(ScalarType::Float)),
        Terminal::new("energy", ValueKind::Scalar(ScalarType::Float)),
    ];
    stream.load(3, &mut terminals).unwrap();
    match &terminals[0].value {
        Value::Scalar(Scalar::Float(v)) => assert_float_eq(*v, 3.0, 1e-9),
        other => panic!("unexpected value {:?}", other),
    }
    assert_eq!(terminals[1].value, Value::Empty);

    assert!(stream.load(5, &mut terminals).unwrap_err().is_state());
}

#[test]
fn test_float_column_cannot_feed_int_terminal() {
    let tmp = tempfile::tempdir().unwrap();
    let paths = write_event_segments(tmp.path(), &[1]);
    let mut stream = SegmentedStream::open(STREAM, &paths).unwrap();
    assert!(stream.bind("energy", 0, ScalarType::Int).unwrap_err().is_config());
    assert!(stream.bind("nope", 0, ScalarType::Int).unwrap_err().is_config());
}
