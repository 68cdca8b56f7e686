//! Debounce and save behaviour of an edit session, driven by virtual time

use mailframe_editor::{
    EditSession, EditorConfig, EditorError, FileStore, FoldOutcome, MemoryStore, PipelineState,
};
use mailframe_tree::{find_by_id, Direction, GlobalSettings, Node, Props, Registry};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn email() -> Node {
    Node::new("root", "Container").with_children(vec![Node::new("s1", "Section").with_children(vec![
        Node::new("h1", "Heading").with_content("Hi"),
        Node::new("t1", "Text").with_content("body"),
    ])])
}

fn session_with(store: Arc<MemoryStore>, config: &EditorConfig) -> EditSession {
    EditSession::new(
        "test-client",
        email(),
        GlobalSettings::default(),
        Arc::new(Registry::standard()),
        store,
        config,
    )
}

fn content(root: &Node, id: &str) -> Option<String> {
    find_by_id(root, id).and_then(|n| n.content.clone())
}

#[tokio::test(start_paused = true)]
async fn test_flush_before_save_keeps_both_edits() {
    let store = Arc::new(MemoryStore::new());
    let session = session_with(store.clone(), &EditorConfig::default());

    // A lands in canonical through the timer
    session.edit_content("h1", "A").unwrap();
    sleep(Duration::from_millis(700)).await;
    assert_eq!(session.pipeline().version(), 1);
    assert_eq!(session.state(), PipelineState::Idle);

    // B is still inside the debounce window
    session.edit_content("t1", "B").unwrap();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(session.state(), PipelineState::Pending);

    assert_eq!(
        session.pipeline().flush(),
        FoldOutcome::Committed { applied: 1, version: 2 }
    );
    let report = session.save().await.unwrap();
    assert_eq!(report.flushed, FoldOutcome::Noop);
    assert_eq!(report.version, 2);

    let saved = store.last().unwrap();
    assert_eq!(content(&saved.root, "h1").as_deref(), Some("A"));
    assert_eq!(content(&saved.root, "t1").as_deref(), Some("B"));

    // canonical equals what was saved, nothing left in the overlay
    assert_eq!(session.pipeline().pending_count(), 0);
    assert_eq!(*session.pipeline().snapshot_for_save().tree, saved.root);

    // the cancelled timer never fires a second fold
    sleep(Duration::from_secs(2)).await;
    assert_eq!(session.pipeline().version(), 2);
    assert!(!session.is_dirty());
}

#[tokio::test(start_paused = true)]
async fn test_save_inside_debounce_window_includes_pending_edit() {
    let store = Arc::new(MemoryStore::new());
    let session = session_with(store.clone(), &EditorConfig::default());

    session.edit_style("t1", "color", "#ff0000").unwrap();
    session.edit_content("t1", "draft").unwrap();
    let report = session.save().await.unwrap();

    assert_eq!(report.flushed, FoldOutcome::Committed { applied: 2, version: 1 });
    let saved = store.last().unwrap();
    let t1 = find_by_id(&saved.root, "t1").unwrap();
    assert_eq!(t1.content.as_deref(), Some("draft"));
    assert_eq!(t1.style().unwrap()["color"], "#ff0000");
}

#[tokio::test(start_paused = true)]
async fn test_timer_that_expired_before_flush_folds_once() {
    let session = session_with(Arc::new(MemoryStore::new()), &EditorConfig::default());
    let mut versions = session.subscribe();

    session.edit_content("h1", "A").unwrap();
    // deadline reached, but the timer task has not been polled yet
    tokio::time::advance(Duration::from_millis(500)).await;
    let flushed = session.pipeline().flush();
    tokio::task::yield_now().await;
    sleep(Duration::from_millis(10)).await;

    match flushed {
        FoldOutcome::Committed { applied: 1, version: 1 } | FoldOutcome::Noop => {}
        other => panic!("unexpected flush outcome {:?}", other),
    }
    assert_eq!(session.pipeline().version(), 1);
    assert_eq!(*versions.borrow_and_update(), 1);
}

fn onclick() -> Props {
    [("onclick".to_string(), json!("track()"))].into_iter().collect()
}

#[tokio::test(start_paused = true)]
async fn test_invalid_edit_does_not_take_valid_edits_down_on_save() {
    let store = Arc::new(MemoryStore::new());
    let session = session_with(store.clone(), &EditorConfig::default());

    session.edit_content("h1", "KEEP ME").unwrap();
    let err = session.edit_props("t1", onclick()).unwrap_err();
    assert!(matches!(err, EditorError::ValidationFailed(_)));
    assert_eq!(session.pipeline().pending_count(), 1);
    assert!(session.is_dirty());

    let report = session.save().await.unwrap();
    assert_eq!(report.flushed, FoldOutcome::Committed { applied: 1, version: 1 });
    let saved = store.last().unwrap();
    assert_eq!(content(&saved.root, "h1").as_deref(), Some("KEEP ME"));
    assert!(!find_by_id(&saved.root, "t1").unwrap().props.contains_key("onclick"));
    assert!(!session.is_dirty());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_edit_inside_window_then_timer_fold() {
    let session = session_with(Arc::new(MemoryStore::new()), &EditorConfig::default());

    session.edit_content("h1", "A").unwrap();
    assert!(session.edit_props("t1", onclick()).is_err());
    sleep(Duration::from_millis(600)).await;

    assert_eq!(session.pipeline().last_fold(), Some(FoldOutcome::Committed { applied: 1, version: 1 }));
    assert_eq!(session.pipeline().rejected_folds(), 0);
    assert_eq!(content(&session.display_tree(), "h1").as_deref(), Some("A"));
}

#[tokio::test(start_paused = true)]
async fn test_structural_edit_after_refused_edit_keeps_pending_work() {
    let store = Arc::new(MemoryStore::new());
    let session = session_with(store.clone(), &EditorConfig::default());

    session.edit_content("h1", "A").unwrap();
    assert!(session.edit_props("t1", onclick()).is_err());

    let tree = session.move_node("t1", Direction::Up).unwrap();
    let section = &tree.children()[0];
    assert_eq!(section.children()[0].id, "t1");
    assert_eq!(content(&tree, "h1").as_deref(), Some("A"));
    assert_eq!(session.pipeline().version(), 2);
    assert!(session.is_dirty());

    session.save().await.unwrap();
    assert_eq!(store.last().unwrap().root, *tree);
    assert!(!session.is_dirty());
}

#[tokio::test(start_paused = true)]
async fn test_discard_then_save_stores_canonical() {
    let store = Arc::new(MemoryStore::new());
    let session = session_with(store.clone(), &EditorConfig::default());

    session.edit_content("h1", "throwaway").unwrap();
    assert!(session.is_dirty());
    assert_eq!(session.discard(), 1);
    assert!(!session.is_dirty());

    session.save().await.unwrap();
    assert_eq!(store.last().unwrap().root, email());
}

#[tokio::test(start_paused = true)]
async fn test_custom_debounce_window() {
    let config = EditorConfig {
        debounce_ms: 50,
        ..Default::default()
    };
    let session = session_with(Arc::new(MemoryStore::new()), &config);

    session.edit_content("h1", "quick").unwrap();
    sleep(Duration::from_millis(60)).await;
    assert_eq!(session.state(), PipelineState::Idle);
    assert_eq!(session.pipeline().version(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_flush_racing_real_timers_never_loses_edits() {
    let config = EditorConfig {
        debounce_ms: 2,
        ..Default::default()
    };
    let session = session_with(Arc::new(MemoryStore::new()), &config);

    for i in 0..50u64 {
        session.edit_content("t1", format!("v{}", i)).unwrap();
        sleep(Duration::from_millis(i % 4)).await;
        session.pipeline().flush();
    }

    let snapshot = session.pipeline().snapshot_for_save();
    assert_eq!(content(&snapshot.tree, "t1").as_deref(), Some("v49"));
    assert_eq!(snapshot.version, 50);
}

#[tokio::test]
async fn test_file_store_save_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path().join("email.json")));
    let session = EditSession::new(
        "cli",
        email(),
        GlobalSettings::default(),
        Arc::new(Registry::standard()),
        store.clone(),
        &EditorConfig::default(),
    );

    session.edit_content("h1", "Saved heading").unwrap();
    let report = session.save().await.unwrap();
    assert!(report.stored_id.0.contains("email.json"));

    let loaded = store.load().await.unwrap();
    assert_eq!(content(&loaded.root, "h1").as_deref(), Some("Saved heading"));
    assert_eq!(loaded.settings, GlobalSettings::default());
}
