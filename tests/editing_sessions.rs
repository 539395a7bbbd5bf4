use deltadoc::{
    ArrayEntry, Changes, Document, Editor, Observer, Path, Value, array, document,
};

fn profile() -> Document {
    document! {
        "name" => "Alice",
        "age" => 43,
        "tags" => array!["admin", "ops"],
        "address" => document! {
            "city" => "London",
            "zip" => "N1 9GU"
        },
    }
}

#[test]
fn a_full_editing_session_replays_exactly() {
    let original = profile();

    // Edit a clone, keeping the original as the replica's starting point.
    let mut editor = Editor::isolated(&original);
    editor.put("age", 44);
    editor.remove("name");
    editor.edit_document("address", |address| {
        address.put("city", "Paris");
        address.remove("zip");
    });
    editor.edit_array("tags", |tags| {
        tags.add_value("dev");
        tags.remove_value(Value::String("ops".into()));
        tags.set_value(0, "root");
    });

    let (edited, changes) = editor.into_parts();
    assert_eq!(changes.len(), 8);

    // The replica started equal to the original, so the log must land it on
    // the edited state.
    let mut replica = original.clone();
    changes.replay(&mut replica).unwrap();
    assert_eq!(replica, edited);

    // And the original was never touched.
    assert_eq!(original, profile());
}

#[test]
fn in_place_and_isolated_sessions_record_the_same_log() {
    let mut direct = profile();
    let mut in_place = Editor::in_place(&mut direct);
    in_place.put("age", 50);
    in_place.edit_array("tags", |tags| {
        tags.clear();
    });
    let log_a = in_place.changes();

    let mut isolated = Editor::isolated(&profile());
    isolated.put("age", 50);
    isolated.edit_array("tags", |tags| {
        tags.clear();
    });
    let log_b = isolated.changes();

    assert_eq!(log_a, log_b);
    assert_eq!(direct, isolated.into_document());
}

#[derive(Default)]
struct EventLog {
    events: Vec<String>,
}

impl Observer for EventLog {
    fn put(&mut self, path: &Path, field: &str, value: &Value) {
        self.events.push(format!("put {path} {field}={value:?}"));
    }

    fn remove(&mut self, path: &Path, field: &str) {
        self.events.push(format!("remove {path} {field}"));
    }

    fn add_array_value(&mut self, path: &Path, entry: &ArrayEntry) {
        self.events.push(format!("add {path} {entry:?}"));
    }

    fn remove_array_value(&mut self, path: &Path, entry: &ArrayEntry) {
        self.events.push(format!("del {path} {entry:?}"));
    }

    fn clear(&mut self, path: &Path) {
        self.events.push(format!("clear {path}"));
    }
}

#[test]
fn observers_see_state_changes_in_recorded_order() {
    let original = document! { "list" => array![1, 2, 3] };

    let mut editor = Editor::isolated(&original);
    editor.put("flag", true);
    editor.put_if_absent("flag", false); // no-op: recorded, never notified
    editor.edit_array("list", |list| {
        list.add_value(4);
        list.remove_at_index(0);
    });
    editor.remove("missing"); // no-op: recorded, never notified
    let changes = editor.changes();
    assert_eq!(changes.len(), 5);

    let mut replica = original.clone();
    let mut log = EventLog::default();
    changes.replay_with(&mut replica, &mut log).unwrap();

    assert_eq!(
        log.events,
        vec![
            "put / flag=true".to_string(),
            "add /list [3]=4".to_string(),
            "del /list [0]=1".to_string(),
        ]
    );
}

#[test]
fn logs_from_consecutive_sessions_compose() {
    let base = document! { "n" => 0 };

    let mut first = Editor::isolated(&base);
    first.put("n", 1);
    first.put("items", array![]);
    let (after_first, first_log) = first.into_parts();

    let mut second = Editor::isolated(&after_first);
    second.edit_array("items", |items| {
        items.add_value("x");
    });
    second.put("n", 2);
    let (after_second, second_log) = second.into_parts();

    // Replay both logs, in order, against the common ancestor.
    let mut replica = base.clone();
    first_log.replay(&mut replica).unwrap();
    second_log.replay(&mut replica).unwrap();

    assert_eq!(replica, after_second);
}

#[test]
fn replaying_against_a_diverged_document_fails_loudly() {
    let original = document! { "list" => array![1, 2] };

    let mut editor = Editor::isolated(&original);
    editor.edit_array("list", |list| {
        list.remove_at_index(1);
    });
    let changes = editor.changes();

    // A replica that lost an element no longer matches the recorded indices.
    let mut diverged = document! { "list" => array![1] };
    assert!(changes.replay(&mut diverged).is_err());
}

#[test]
fn an_empty_session_is_an_empty_log() {
    let original = profile();
    let editor = Editor::isolated(&original);
    let changes = editor.changes();
    assert!(changes.is_empty());
    assert_eq!(changes, Changes::new());
}
