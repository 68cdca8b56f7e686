//! AI refinement against a session whose tree changes while the adapter runs

use async_trait::async_trait;
use mailframe_editor::{
    AdapterError, EditSession, EditorConfig, EditorError, MemoryStore, RefineAdapter, Refiner,
};
use mailframe_tree::{find_by_id, path_of, GlobalSettings, Node, PatchError, Registry};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const T1_PATH: &str = "root.children[0].children[1]";

/// Answers every request with `response` after `delay`
struct ScriptedAdapter {
    response: Result<Value, AdapterError>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedAdapter {
    fn new(response: Result<Value, AdapterError>, delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            response,
            delay: Duration::from_millis(delay_ms),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl RefineAdapter for ScriptedAdapter {
    async fn refine(&self, snapshot: &Node, _prompt: &str) -> Result<Value, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!snapshot.id.is_empty());
        sleep(self.delay).await;
        self.response.clone()
    }
}

fn session() -> EditSession {
    let root = Node::new("root", "Container").with_children(vec![Node::new("s1", "Section").with_children(vec![
        Node::new("h1", "Heading").with_content("Hi"),
        Node::new("t1", "Text").with_content("body"),
    ])]);
    EditSession::new(
        "ai",
        root,
        GlobalSettings::default(),
        Arc::new(Registry::standard()),
        Arc::new(MemoryStore::new()),
        &EditorConfig::default(),
    )
}

fn refiner(adapter: Arc<ScriptedAdapter>) -> Refiner {
    Refiner::new(adapter, &EditorConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_refinement_applies_to_current_canonical() {
    let session = session();
    let adapter = ScriptedAdapter::new(Ok(json!({ "content": "X" })), 1_000);
    let refiner = refiner(adapter.clone());

    // pending UI edit on another node must survive the AI apply
    session.edit_content("h1", "Hello").unwrap();
    let refinement = refiner.refine_at(&session, T1_PATH, "make it punchier").await.unwrap();

    assert_eq!(refinement.node_id, "t1");
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
    let snapshot = session.pipeline().snapshot_for_save();
    assert_eq!(find_by_id(&snapshot.tree, "t1").unwrap().content.as_deref(), Some("X"));
    assert_eq!(find_by_id(&snapshot.tree, "h1").unwrap().content.as_deref(), Some("Hello"));
}

#[tokio::test(start_paused = true)]
async fn test_target_deleted_during_refinement() {
    let session = session();
    let refiner = refiner(ScriptedAdapter::new(Ok(json!({ "content": "X" })), 1_000));

    let (result, deleted) = tokio::join!(refiner.refine_at(&session, T1_PATH, "shorter"), async {
        sleep(Duration::from_millis(100)).await;
        session.delete("t1")
    });

    deleted.unwrap();
    assert!(matches!(result, Err(EditorError::PathInvalid { .. })), "{:?}", result);

    let snapshot = session.pipeline().snapshot_for_save();
    assert!(find_by_id(&snapshot.tree, "t1").is_none());
    assert_eq!(snapshot.version, 1);
    assert!(!serde_json::to_string(&*snapshot.tree).unwrap().contains("\"X\""));
}

#[tokio::test(start_paused = true)]
async fn test_target_shifted_during_refinement() {
    let session = session();
    let refiner = refiner(ScriptedAdapter::new(Ok(json!({ "content": "X" })), 1_000));

    // duplicating h1 pushes t1 to children[2]; the old path now names the copy
    let (result, duplicated) = tokio::join!(refiner.refine_at(&session, T1_PATH, "shorter"), async {
        sleep(Duration::from_millis(100)).await;
        session.duplicate("h1")
    });

    let tree = duplicated.unwrap();
    assert_eq!(path_of(&tree, "t1").as_deref(), Some("root.children[0].children[2]"));
    let EditorError::PathInvalid { reason, .. } = result.unwrap_err() else {
        panic!("expected PathInvalid");
    };
    assert!(reason.contains("instead of 't1'"));

    let snapshot = session.pipeline().snapshot_for_save();
    assert_eq!(find_by_id(&snapshot.tree, "t1").unwrap().content.as_deref(), Some("body"));
}

#[tokio::test(start_paused = true)]
async fn test_adapter_timeout_is_retryable() {
    let session = session();
    let adapter = ScriptedAdapter::new(Ok(json!({ "content": "late" })), 60_000);
    let refiner = Refiner::new(
        adapter,
        &EditorConfig {
            refine_timeout_ms: 5_000,
            ..Default::default()
        },
    );

    let err = refiner.refine_at(&session, T1_PATH, "anything").await.unwrap_err();
    assert!(matches!(err, EditorError::Adapter(AdapterError::Timeout(d)) if d == Duration::from_secs(5)));
    assert!(err.is_retryable());
    assert_eq!(session.pipeline().version(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_adapter_failure_is_retryable() {
    let session = session();
    let refiner = refiner(ScriptedAdapter::new(Err(AdapterError::Failed("503".into())), 10));

    let err = refiner.refine_at(&session, T1_PATH, "anything").await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_malformed_response_is_rejected() {
    let session = session();
    let refiner = refiner(ScriptedAdapter::new(Ok(json!({ "children": [] })), 10));

    let err = refiner.refine_at(&session, T1_PATH, "restructure").await.unwrap_err();
    assert!(matches!(err, EditorError::Patch(PatchError::UnknownField(ref f)) if f == "children"));
    assert!(!err.is_retryable());
    assert_eq!(session.pipeline().version(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_response_that_breaks_schema_is_rejected() {
    let session = session();
    let refiner = refiner(ScriptedAdapter::new(Ok(json!({ "props": { "src": "x.png" } })), 10));

    let err = refiner.refine_at(&session, T1_PATH, "add an image").await.unwrap_err();
    let EditorError::ValidationFailed(errors) = err else {
        panic!("expected ValidationFailed");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(session.pipeline().version(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unresolvable_path_never_calls_adapter() {
    let session = session();
    let adapter = ScriptedAdapter::new(Ok(json!({ "content": "X" })), 10);
    let refiner = refiner(adapter.clone());

    let err = refiner.refine_at(&session, "root.children[3]", "x").await.unwrap_err();
    assert!(matches!(err, EditorError::PathInvalid { .. }));
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 0);
}
