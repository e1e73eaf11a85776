//! Browser tests for the localStorage-backed history
#![cfg(target_arch = "wasm32")]

use chrono::Utc;
use utubext::analysis::{Analysis, AnalysisRecord, CompetitionLevel};
use utubext::recorder::Recorder;
use utubext::storage::{HistoryVault, LOCAL_HISTORY_CAP, LocalStore, WebLocalStore};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn create_test_analysis(title: &str, trend_score: u8) -> Analysis {
    Analysis {
        title: title.to_string(),
        summary: "Summary".to_string(),
        trend_score,
        competition_level: CompetitionLevel::Low,
        top_keywords: vec![],
        viral_hooks: vec![],
        suggested_titles: vec![],
        full_script_prompt: String::new(),
        sources: vec![],
    }
}

fn fresh_store(key: &str) -> WebLocalStore {
    let storage = web_sys::window().unwrap().local_storage().unwrap().unwrap();
    storage.remove_item(key).unwrap();
    WebLocalStore::open_with_key(key).unwrap()
}

#[wasm_bindgen_test]
fn test_missing_key_loads_empty() {
    let store = fresh_store("utubext_test_empty");

    assert!(store.load().unwrap().is_empty());
}

#[wasm_bindgen_test]
fn test_store_and_load() {
    let store = fresh_store("utubext_test_round_trip");
    let mut vault = HistoryVault::new();
    vault.push_front(AnalysisRecord::new(
        "local_1".to_string(),
        Utc::now(),
        create_test_analysis("Topic", 72),
    ));

    store.store(&vault).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.records()[0].id, "local_1");
}

#[wasm_bindgen_test]
fn test_corrupt_value_is_a_decode_error() {
    let key = "utubext_test_corrupt";
    let store = fresh_store(key);
    let storage = web_sys::window().unwrap().local_storage().unwrap().unwrap();
    storage.set_item(key, "{not json").unwrap();

    assert!(store.load().is_err());
}

#[wasm_bindgen_test]
async fn test_recorder_keeps_cap_in_local_storage() {
    let key = "utubext_test_recorder";
    let _ = fresh_store(key);
    let recorder = Recorder::new(None, Box::new(WebLocalStore::open_with_key(key).unwrap()));

    for i in 0..=LOCAL_HISTORY_CAP {
        recorder.save(&create_test_analysis(&format!("Topic {}", i), 10)).await;
    }

    let recent = recorder.fetch_recent(3).await;
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].analysis.title, format!("Topic {}", LOCAL_HISTORY_CAP));

    let stored = WebLocalStore::open_with_key(key).unwrap().load().unwrap();
    assert_eq!(stored.len(), LOCAL_HISTORY_CAP);
}
