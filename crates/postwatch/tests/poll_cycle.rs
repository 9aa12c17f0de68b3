use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use postwatch::watch::fetch::{DocumentFetcher, FetchError};
use postwatch::watch::notify::{NotificationSink, NotifyError};
use postwatch::watch::record::{Posting, Snapshot};
use postwatch::watch::service::PollService;
use postwatch::watch::store::{SnapshotStore, StoreError};
use reqwest::StatusCode;

const BOARD_A: &str = "org/board-a";
const BOARD_B: &str = "org/board-b";

/// What the fake fetcher should do for a source on the next call.
#[derive(Clone)]
enum DocumentScript {
    Text(String),
    Missing,
    Fail,
}

#[derive(Default)]
struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, DocumentScript>>,
}

impl ScriptedFetcher {
    fn set(&self, source: &str, script: DocumentScript) {
        self.scripts
            .lock()
            .expect("fetcher mutex poisoned")
            .insert(source.to_string(), script);
    }
}

#[async_trait]
impl DocumentFetcher for ScriptedFetcher {
    async fn fetch_document(&self, source_id: &str) -> Result<Option<String>, FetchError> {
        let script = self
            .scripts
            .lock()
            .expect("fetcher mutex poisoned")
            .get(source_id)
            .cloned();
        match script {
            Some(DocumentScript::Text(text)) => Ok(Some(text)),
            Some(DocumentScript::Missing) | None => Ok(None),
            Some(DocumentScript::Fail) => Err(FetchError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                url: format!("https://api.example/{source_id}"),
            }),
        }
    }
}

#[derive(Default)]
struct MemoryStore {
    saved: Mutex<Vec<Snapshot>>,
}

impl MemoryStore {
    fn last_saved(&self) -> Option<Snapshot> {
        self.saved.lock().expect("store mutex poisoned").last().cloned()
    }

    fn save_count(&self) -> usize {
        self.saved.lock().expect("store mutex poisoned").len()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, known_sources: &[String]) -> Snapshot {
        known_sources
            .iter()
            .map(|source| (source.clone(), Default::default()))
            .collect()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.saved
            .lock()
            .expect("store mutex poisoned")
            .push(snapshot.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    notified: Mutex<Vec<Posting>>,
    announcements: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn notified(&self) -> Vec<Posting> {
        self.notified.lock().expect("sink mutex poisoned").clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn announce(&self, text: &str) -> Result<(), NotifyError> {
        self.announcements
            .lock()
            .expect("sink mutex poisoned")
            .push(text.to_string());
        Ok(())
    }

    async fn notify(&self, posting: &Posting) -> Result<(), NotifyError> {
        self.notified
            .lock()
            .expect("sink mutex poisoned")
            .push(posting.clone());
        Ok(())
    }
}

fn board_document(rows: &[&str]) -> String {
    let mut text = String::from(
        "# Openings\n\n\
         | Company | Role | Location | Application/Link | Date Posted |\n\
         | ------- | ---- | -------- | ---------------- | ----------- |\n",
    );
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}

fn service_with(
    sources: &[&str],
) -> (
    PollService<ScriptedFetcher, MemoryStore, RecordingSink>,
    Arc<ScriptedFetcher>,
    Arc<MemoryStore>,
    Arc<RecordingSink>,
) {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let store = Arc::new(MemoryStore::default());
    let sink = Arc::new(RecordingSink::default());
    let service = PollService::new(
        sources.iter().map(|s| s.to_string()).collect(),
        fetcher.clone(),
        store.clone(),
        sink.clone(),
    );
    (service, fetcher, store, sink)
}

#[tokio::test]
async fn first_cycle_notifies_every_posting_and_persists() {
    let (mut service, fetcher, store, sink) = service_with(&[BOARD_A]);
    fetcher.set(
        BOARD_A,
        DocumentScript::Text(board_document(&[
            "| Acme | SWE Intern | NYC, NY | <a href=\"https://apply.example/1\">Apply</a> | Jun 01 |",
            "| ↳ | Data Intern | Remote | <a href=\"https://apply.example/2\">Apply</a> | Jun 01 |",
        ])),
    );

    let outcome = service.run_cycle().await.expect("cycle succeeds");

    assert_eq!(outcome.sources_checked, 1);
    assert!(outcome.sources_skipped.is_empty());
    assert_eq!(outcome.new_postings.len(), 2);
    assert_eq!(sink.notified().len(), 2);

    let saved = store.last_saved().expect("snapshot persisted");
    assert_eq!(saved[BOARD_A].len(), 2);
}

#[tokio::test]
async fn unchanged_second_cycle_is_quiet() {
    let (mut service, fetcher, _store, sink) = service_with(&[BOARD_A]);
    fetcher.set(
        BOARD_A,
        DocumentScript::Text(board_document(&[
            "| Acme | SWE Intern | NYC, NY | <a href=\"https://apply.example/1\">Apply</a> | Jun 01 |",
        ])),
    );

    service.run_cycle().await.expect("first cycle");
    let outcome = service.run_cycle().await.expect("second cycle");

    assert!(outcome.new_postings.is_empty());
    assert_eq!(sink.notified().len(), 1);
}

#[tokio::test]
async fn a_new_row_is_notified_exactly_once() {
    let (mut service, fetcher, _store, sink) = service_with(&[BOARD_A]);
    fetcher.set(
        BOARD_A,
        DocumentScript::Text(board_document(&[
            "| Acme | SWE Intern | NYC, NY | <a href=\"https://apply.example/1\">Apply</a> | Jun 01 |",
        ])),
    );
    service.run_cycle().await.expect("first cycle");

    fetcher.set(
        BOARD_A,
        DocumentScript::Text(board_document(&[
            "| Acme | SWE Intern | NYC, NY | <a href=\"https://apply.example/1\">Apply</a> | Jun 01 |",
            "| Globex | Data Intern | Remote | <a href=\"https://apply.example/2\">Apply</a> | Jun 02 |",
        ])),
    );
    let second = service.run_cycle().await.expect("second cycle");
    let third = service.run_cycle().await.expect("third cycle");

    assert_eq!(second.new_postings.len(), 1);
    assert_eq!(second.new_postings[0].company, "Globex");
    assert!(third.new_postings.is_empty());
    assert_eq!(sink.notified().len(), 2);
}

#[tokio::test]
async fn failed_source_keeps_its_previous_snapshot() {
    let (mut service, fetcher, store, sink) = service_with(&[BOARD_A, BOARD_B]);
    fetcher.set(
        BOARD_A,
        DocumentScript::Text(board_document(&[
            "| Acme | SWE Intern | NYC, NY | <a href=\"https://apply.example/1\">Apply</a> | Jun 01 |",
        ])),
    );
    fetcher.set(
        BOARD_B,
        DocumentScript::Text(board_document(&[
            "| Globex | Data Intern | Remote | <a href=\"https://apply.example/2\">Apply</a> | Jun 01 |",
        ])),
    );
    service.run_cycle().await.expect("first cycle");

    fetcher.set(BOARD_A, DocumentScript::Fail);
    fetcher.set(
        BOARD_B,
        DocumentScript::Text(board_document(&[
            "| Globex | Data Intern | Remote | <a href=\"https://apply.example/2\">Apply</a> | Jun 01 |",
            "| Initech | Platform Intern | Austin, TX | <a href=\"https://apply.example/3\">Apply</a> | Jun 02 |",
        ])),
    );
    let outcome = service.run_cycle().await.expect("second cycle");

    assert_eq!(outcome.sources_checked, 1);
    assert_eq!(outcome.sources_skipped, vec![BOARD_A.to_string()]);
    assert_eq!(outcome.new_postings.len(), 1);
    assert_eq!(outcome.new_postings[0].company, "Initech");

    // The failed board keeps its last good state in the persisted snapshot.
    let saved = store.last_saved().expect("snapshot persisted");
    assert_eq!(saved[BOARD_A].len(), 1);
    assert_eq!(saved[BOARD_B].len(), 2);
    assert_eq!(sink.notified().len(), 2);
}

#[tokio::test]
async fn absent_document_skips_the_source() {
    let (mut service, fetcher, store, sink) = service_with(&[BOARD_A]);
    fetcher.set(BOARD_A, DocumentScript::Missing);

    let outcome = service.run_cycle().await.expect("cycle succeeds");

    assert_eq!(outcome.sources_checked, 0);
    assert_eq!(outcome.sources_skipped, vec![BOARD_A.to_string()]);
    assert!(outcome.new_postings.is_empty());
    assert!(sink.notified().is_empty());
    // The snapshot is still written once per cycle.
    assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn document_without_table_clears_the_source_snapshot() {
    let (mut service, fetcher, store, _sink) = service_with(&[BOARD_A]);
    fetcher.set(
        BOARD_A,
        DocumentScript::Text(board_document(&[
            "| Acme | SWE Intern | NYC, NY | <a href=\"https://apply.example/1\">Apply</a> | Jun 01 |",
        ])),
    );
    service.run_cycle().await.expect("first cycle");

    fetcher.set(
        BOARD_A,
        DocumentScript::Text("# Board retired\n\nNo table anymore.\n".to_string()),
    );
    let outcome = service.run_cycle().await.expect("second cycle");

    // No header means zero records, and the replacement map drops the old
    // entries without reporting removals.
    assert_eq!(outcome.sources_checked, 1);
    assert!(outcome.new_postings.is_empty());
    let saved = store.last_saved().expect("snapshot persisted");
    assert!(saved[BOARD_A].is_empty());
}
