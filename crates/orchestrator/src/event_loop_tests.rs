use std::collections::VecDeque;

use pipeline::{EventSourceError, IssueAction};
use pretty_assertions::assert_eq;

use super::*;
use crate::test_support::{issue, push, HarnessBuilder, QueuedEvents};

#[tokio::test]
async fn test_every_event_is_dispatched_before_returning() {
    let harness = HarnessBuilder::default().build();
    let mut source = QueuedEvents(VecDeque::from(vec![
        Ok(push(&["repositories/a.yml"])),
        Ok(issue(IssueAction::Opened, 9, &["repository-creation"])),
        Ok(push(&["README.md"])),
    ]));

    run_event_loop(harness.dispatcher.clone(), &mut source)
        .await
        .unwrap();

    let runs = harness
        .journal
        .entries()
        .into_iter()
        .filter(|e| e.starts_with("run:"))
        .count();
    assert_eq!(runs, 2);
}

#[tokio::test]
async fn test_undecodable_events_are_dropped() {
    let harness = HarnessBuilder::default().build();
    let mut source = QueuedEvents(VecDeque::from(vec![
        Err(EventSourceError::Decode {
            message: "missing field `repository`".to_string(),
        }),
        Ok(push(&["repositories/a.yml"])),
    ]));

    run_event_loop(harness.dispatcher.clone(), &mut source)
        .await
        .unwrap();

    assert_eq!(harness.runner.env.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unavailable_source_stops_the_loop() {
    let harness = HarnessBuilder::default().build();
    let mut source = QueuedEvents(VecDeque::from(vec![
        Err(EventSourceError::Unavailable {
            message: "listener stopped".to_string(),
        }),
        Ok(push(&["repositories/a.yml"])),
    ]));

    let result = run_event_loop(harness.dispatcher.clone(), &mut source).await;

    assert!(matches!(result, Err(EventSourceError::Unavailable { .. })));
    assert!(harness.journal.entries().is_empty());
}
