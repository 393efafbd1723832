use std::collections::BTreeMap;

use selnav::app::history::{HistoryOptions, SelectionHistory};
use selnav::app::host::{ContextHost, EntityTree, SelectionHost};
use selnav::app::listener::SuppressionPolicy;
use selnav::app::notify::SelectionChange;
use selnav::app::session::HistorySnapshot;
use selnav::domain::model::{EntityPath, SelectionRecord};
use selnav::infra::scene::{EntityId, NodeSpec, SceneFile, SceneHost};

const DOOR: &str = "Door.prefab";
const WINDOW: &str = "Window.prefab";

fn scene() -> SceneHost {
    SceneHost::new(SceneFile {
        scene: NodeSpec::with_children(
            "Level",
            vec![
                NodeSpec::leaf("A"),
                NodeSpec::leaf("B"),
                NodeSpec::leaf("C"),
                NodeSpec::leaf("D"),
            ],
        ),
        documents: BTreeMap::from([
            (
                DOOR.to_owned(),
                NodeSpec::with_children(
                    "Door",
                    vec![NodeSpec::with_children("Frame", vec![NodeSpec::leaf("Handle")])],
                ),
            ),
            (
                WINDOW.to_owned(),
                NodeSpec::with_children(
                    "Window",
                    vec![NodeSpec::with_children("Pane", vec![NodeSpec::leaf("Glass")])],
                ),
            ),
        ]),
    })
}

fn select(
    host: &mut SceneHost,
    history: &mut SelectionHistory<SceneHost>,
    path: &str,
) -> EntityId {
    let entity = host.find(path).unwrap_or_else(|| panic!("no entity at {path}"));
    host.set_current_selection(Some(entity));
    history.pump();
    entity
}

fn back(host: &mut SceneHost, history: &mut SelectionHistory<SceneHost>) {
    assert!(history.back(host), "expected to go back");
    history.pump();
}

fn forward(host: &mut SceneHost, history: &mut SelectionHistory<SceneHost>) {
    assert!(history.forward(host), "expected to go forward");
    history.pump();
}

fn paths(records: &[SelectionRecord<EntityId, String>]) -> Vec<String> {
    records.iter().map(|record| record.path.to_string()).collect()
}

fn selected_path(host: &SceneHost) -> Option<String> {
    host.current_selection()
        .map(|entity| host.path_to(entity).to_string())
}

fn record_count(history: &SelectionHistory<SceneHost>) -> usize {
    let store = history.store();
    store.previous().len() + store.next().len() + usize::from(store.current().is_some())
}

#[test]
fn nothing_to_navigate_at_start() {
    let mut host = scene();
    let mut history = SelectionHistory::attach(&mut host, &HistoryOptions::default());

    assert!(!history.can_go_back());
    assert!(!history.can_go_forward());
    assert!(!history.back(&mut host));
    assert!(!history.forward(&mut host));
    assert_eq!(host.current_selection(), None);
}

#[test]
fn back_and_forward_follow_browser_history() {
    let mut host = scene();
    let mut history = SelectionHistory::attach(&mut host, &HistoryOptions::default());
    let a = select(&mut host, &mut history, "Level/A");
    let b = select(&mut host, &mut history, "Level/B");
    select(&mut host, &mut history, "Level/C");

    back(&mut host, &mut history);
    assert_eq!(host.current_selection(), Some(b));
    assert_eq!(paths(history.store().next()), ["Level/C"]);

    back(&mut host, &mut history);
    assert_eq!(host.current_selection(), Some(a));
    assert_eq!(paths(history.store().next()), ["Level/C", "Level/B"]);
    assert!(!history.can_go_back());

    forward(&mut host, &mut history);
    assert_eq!(host.current_selection(), Some(b));
    assert_eq!(paths(history.store().next()), ["Level/C"]);

    let d = select(&mut host, &mut history, "Level/D");
    assert!(!history.can_go_forward());
    assert_eq!(paths(history.store().previous()), ["Level/A", "Level/B"]);
    assert_eq!(host.current_selection(), Some(d));
}

#[test]
fn back_k_then_forward_k_returns_to_latest() {
    let names = ["Level/A", "Level/B", "Level/C", "Level/D"];
    for k in 0..names.len() {
        let mut host = scene();
        let mut history = SelectionHistory::attach(&mut host, &HistoryOptions::default());
        for name in names {
            select(&mut host, &mut history, name);
        }
        for _ in 0..k {
            back(&mut host, &mut history);
        }
        for _ in 0..k {
            forward(&mut host, &mut history);
        }
        assert_eq!(selected_path(&host).as_deref(), Some("Level/D"), "k = {k}");
    }
}

#[test]
fn restores_never_commit_their_echo() {
    let mut host = scene();
    let mut history = SelectionHistory::attach(&mut host, &HistoryOptions::default());
    for name in ["Level/A", "Level/B", "Level/C"] {
        select(&mut host, &mut history, name);
    }
    let before = record_count(&history);

    assert!(history.back(&mut host));
    assert!(history.listener().is_suppressed());
    assert_eq!(history.pump(), 0);
    assert!(!history.listener().is_suppressed());

    assert!(history.forward(&mut host));
    assert_eq!(history.pump(), 0);

    assert_eq!(record_count(&history), before);
    assert_eq!(selected_path(&host).as_deref(), Some("Level/C"));
}

#[test]
fn back_reopens_closed_context_and_resolves_by_path() {
    let mut host = scene();
    let mut history = SelectionHistory::attach(&mut host, &HistoryOptions::default());

    host.open_context(&DOOR.to_owned()).unwrap();
    let handle = select(&mut host, &mut history, "Door/Frame/Handle");
    assert!(host.close_context());
    history.pump();
    let f = select(&mut host, &mut history, "Level/B");

    back(&mut host, &mut history);

    assert_eq!(host.current_context().as_deref(), Some(DOOR));
    let restored = host.current_selection().expect("handle selected");
    assert_ne!(restored, handle, "old reference was despawned");
    assert_eq!(Some(restored), host.find("Door/Frame/Handle"));
    assert_eq!(history.store().current().and_then(|r| r.target), Some(restored));

    forward(&mut host, &mut history);
    assert_eq!(host.current_context(), None);
    assert_eq!(host.current_selection(), Some(f));
}

#[test]
fn live_target_in_outer_context_closes_nested_ones() {
    let mut host = scene();
    let mut history = SelectionHistory::attach(&mut host, &HistoryOptions::default());
    let a = select(&mut host, &mut history, "Level/A");
    host.open_context(&DOOR.to_owned()).unwrap();
    select(&mut host, &mut history, "Door/Frame");

    back(&mut host, &mut history);
    assert_eq!(host.current_context(), None);
    assert_eq!(host.current_selection(), Some(a));
    assert_eq!(paths(history.store().next()), ["Door/Frame"]);

    forward(&mut host, &mut history);
    assert_eq!(host.current_context().as_deref(), Some(DOOR));
    assert_eq!(selected_path(&host).as_deref(), Some("Door/Frame"));
}

#[test]
fn reloaded_context_falls_back_to_paths() {
    let mut host = scene();
    let mut history = SelectionHistory::attach(&mut host, &HistoryOptions::default());
    host.open_context(&DOOR.to_owned()).unwrap();
    select(&mut host, &mut history, "Door/Frame/Handle");
    select(&mut host, &mut history, "Door");

    assert!(host.reload_context().unwrap());
    history.pump();
    assert_eq!(host.current_selection(), None);

    back(&mut host, &mut history);
    assert_eq!(host.current_selection(), host.find("Door"));

    back(&mut host, &mut history);
    assert_eq!(host.current_selection(), host.find("Door/Frame/Handle"));
    assert_eq!(host.open_contexts().count(), 1);
}

#[test]
fn missing_path_segment_clears_selection() {
    let mut host = scene();
    let b = host.find("Level/B");
    host.set_current_selection(b);

    let snapshot = HistorySnapshot {
        current: history_record(b, "Level/B", None, false),
        previous: vec![SelectionRecord {
            target: None,
            path: EntityPath::from_segments(["Door", "Frame", "Knob"]),
            context_source: Some(DOOR.to_owned()),
            context_open: true,
        }],
        ..HistorySnapshot::default()
    };
    let mut history =
        SelectionHistory::from_snapshot(&mut host, snapshot, &HistoryOptions::default());

    back(&mut host, &mut history);
    assert_eq!(host.current_context().as_deref(), Some(DOOR));
    assert_eq!(host.current_selection(), None);
    assert_eq!(paths(history.store().next()), ["Level/B"]);
}

#[test]
fn unopenable_context_leaves_selection_unchanged() {
    let mut host = scene();
    let b = host.find("Level/B");
    host.set_current_selection(b);

    let snapshot = HistorySnapshot {
        current: history_record(b, "Level/B", None, false),
        previous: vec![SelectionRecord {
            target: None,
            path: EntityPath::from_segments(["Gone", "Thing"]),
            context_source: Some("Gone.prefab".to_owned()),
            context_open: true,
        }],
        ..HistorySnapshot::default()
    };
    let mut history =
        SelectionHistory::from_snapshot(&mut host, snapshot, &HistoryOptions::default());

    back(&mut host, &mut history);
    assert_eq!(host.current_selection(), b);
    assert_eq!(host.current_context(), None);
    assert!(history.can_go_forward());
    assert!(!history.listener().is_suppressed());
}

#[test]
fn unopenable_context_keeps_open_contexts_and_selection() {
    let mut host = scene();
    let snapshot = HistorySnapshot {
        previous: vec![SelectionRecord {
            target: None,
            path: EntityPath::from_segments(["Gone", "Thing"]),
            context_source: Some("Gone.prefab".to_owned()),
            context_open: true,
        }],
        ..HistorySnapshot::default()
    };
    let mut history =
        SelectionHistory::from_snapshot(&mut host, snapshot, &HistoryOptions::default());
    host.open_context(&DOOR.to_owned()).unwrap();
    let handle = select(&mut host, &mut history, "Door/Frame/Handle");

    back(&mut host, &mut history);
    assert_eq!(host.current_selection(), Some(handle));
    assert_eq!(host.current_context().as_deref(), Some(DOOR));
    assert!(host.is_live(&handle));
    assert!(!history.listener().is_suppressed());
    assert_eq!(paths(history.store().next()), ["Door/Frame/Handle"]);
}

#[test]
fn changes_drained_together_keep_their_context() {
    let mut host = scene();
    let mut history = SelectionHistory::attach(&mut host, &HistoryOptions::default());
    select(&mut host, &mut history, "Level/A");

    host.open_context(&DOOR.to_owned()).unwrap();
    let handle = host.find("Door/Frame/Handle");
    host.set_current_selection(handle);
    host.close_context();
    let b = host.find("Level/B");
    host.set_current_selection(b);
    assert_eq!(history.pump(), 3);

    let previous = history.store().previous();
    assert_eq!(paths(previous), ["Level/A", "Door/Frame/Handle"]);
    assert_eq!(previous[1].context_source.as_deref(), Some(DOOR));
    assert!(previous[1].context_open);

    back(&mut host, &mut history);
    assert_eq!(host.current_context().as_deref(), Some(DOOR));
    assert_eq!(selected_path(&host).as_deref(), Some("Door/Frame/Handle"));
}

#[test]
fn reused_ids_from_a_saved_history_are_not_trusted() {
    let mut host = scene();
    let mut history = SelectionHistory::attach(&mut host, &HistoryOptions::default());
    select(&mut host, &mut history, "Level/A");
    host.open_context(&DOOR.to_owned()).unwrap();
    let handle = select(&mut host, &mut history, "Door/Frame/Handle");
    host.close_context();
    history.pump();
    select(&mut host, &mut history, "Level/B");
    let snapshot = history.snapshot();

    let mut reloaded = scene();
    reloaded.open_context(&WINDOW.to_owned()).unwrap();
    assert!(reloaded.is_live(&handle));
    assert_eq!(reloaded.path_to(handle).to_string(), "Window/Pane/Glass");

    let mut restored =
        SelectionHistory::from_snapshot(&mut reloaded, snapshot, &HistoryOptions::default());
    back(&mut reloaded, &mut restored);
    assert_eq!(reloaded.current_context().as_deref(), Some(DOOR));
    assert_eq!(
        selected_path(&reloaded).as_deref(),
        Some("Door/Frame/Handle")
    );
    assert_ne!(reloaded.current_selection(), Some(handle));
}

#[test]
fn unknown_context_source_clears_selection() {
    let mut host = scene();
    let b = host.find("Level/B");
    host.set_current_selection(b);

    let snapshot = HistorySnapshot {
        current: history_record(b, "Level/B", None, false),
        previous: vec![SelectionRecord {
            target: None,
            path: EntityPath::from_segments(["Level", "A"]),
            context_source: None,
            context_open: true,
        }],
        ..HistorySnapshot::default()
    };
    let mut history =
        SelectionHistory::from_snapshot(&mut host, snapshot, &HistoryOptions::default());

    back(&mut host, &mut history);
    assert_eq!(host.current_selection(), None);
    assert_eq!(host.current_context(), None);
}

#[test]
fn view_history_selection_is_not_recorded() {
    let mut host = scene();
    let mut history = SelectionHistory::attach(&mut host, &HistoryOptions::default());
    select(&mut host, &mut history, "Level/A");
    select(&mut host, &mut history, "Level/B");

    let view = history.view_history(&mut host);
    assert_eq!(history.pump(), 0);
    assert_eq!(host.current_selection(), host.history_inspector());
    assert_eq!(paths(&view.previous), ["Level/A"]);

    select(&mut host, &mut history, "Level/C");
    assert_eq!(paths(history.store().previous()), ["Level/A", "Level/B"]);
}

#[test]
fn depth_cap_drops_oldest_entries() {
    let mut host = scene();
    let options = HistoryOptions {
        max_depth: 2,
        suppression: SuppressionPolicy::NextChange,
    };
    let mut history = SelectionHistory::attach(&mut host, &options);
    for name in ["Level/A", "Level/B", "Level/C", "Level/D"] {
        select(&mut host, &mut history, name);
    }
    assert_eq!(paths(history.store().previous()), ["Level/B", "Level/C"]);
}

#[test]
fn expected_value_policy_commits_changes_made_before_the_echo() {
    let mut host = scene();
    let options = HistoryOptions {
        suppression: SuppressionPolicy::ExpectedValue,
        ..HistoryOptions::default()
    };
    let mut history = SelectionHistory::attach(&mut host, &options);
    select(&mut host, &mut history, "Level/A");
    select(&mut host, &mut history, "Level/B");

    assert!(history.back(&mut host));
    let stray = host.find("Level/D");
    history.handle_selection_changed(SelectionChange::capture(&host, stray.as_ref()));
    assert!(history.listener().is_suppressed());
    assert_eq!(history.pump(), 0);
    assert!(!history.listener().is_suppressed());
    let current = history.store().current().map(|record| record.path.to_string());
    assert_eq!(current.as_deref(), Some("Level/D"));
}

#[test]
fn persisted_history_continues_after_reload() {
    let mut host = scene();
    let mut history = SelectionHistory::attach(&mut host, &HistoryOptions::default());
    select(&mut host, &mut history, "Level/A");
    host.open_context(&DOOR.to_owned()).unwrap();
    select(&mut host, &mut history, "Door/Frame/Handle");

    let json = serde_json::to_string(&history.snapshot()).unwrap();
    let snapshot: HistorySnapshot<EntityId, String> = serde_json::from_str(&json).unwrap();
    assert!(!snapshot.suppress_next_change);

    let mut reloaded = scene();
    let mut restored =
        SelectionHistory::from_snapshot(&mut reloaded, snapshot, &HistoryOptions::default());
    assert!(restored.can_go_back());

    back(&mut reloaded, &mut restored);
    assert_eq!(selected_path(&reloaded).as_deref(), Some("Level/A"));

    forward(&mut reloaded, &mut restored);
    assert_eq!(reloaded.current_context().as_deref(), Some(DOOR));
    assert_eq!(
        selected_path(&reloaded).as_deref(),
        Some("Door/Frame/Handle")
    );
}

fn history_record(
    target: Option<EntityId>,
    path: &str,
    source: Option<&str>,
    open: bool,
) -> Option<SelectionRecord<EntityId, String>> {
    Some(SelectionRecord {
        target,
        path: path.parse().ok()?,
        context_source: source.map(str::to_owned),
        context_open: open,
    })
}
