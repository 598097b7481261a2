/// End-to-end recording sessions
/// Tests editor notifications → history manager → history directory → replay
use std::collections::HashMap;
use std::sync::Arc;

use editlog_common::{now_millis, splice};
use editlog_history::{replay, FileAction, Operation, ResourceAction, ResourceTarget};
use editlog_recorder::{DocumentSource, ResourceChange, TextChange};
use editlog_workspace::{Config, HistoryStore, RecordingSession};
use parking_lot::Mutex;

#[derive(Default)]
struct Buffers(Mutex<HashMap<String, String>>);

impl DocumentSource for Buffers {
    fn current_text(&self, path: &str) -> Option<String> {
        self.0.lock().get(path).cloned()
    }
}

struct Shell {
    buffers: Arc<Buffers>,
    session: RecordingSession,
    _dir: tempfile::TempDir,
}

impl Shell {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let buffers = Arc::new(Buffers::default());
        let session = RecordingSession::new(dir.path(), Config::default(), buffers.clone());
        Self {
            buffers,
            session,
            _dir: dir,
        }
    }

    fn text(&self, path: &str) -> String {
        self.buffers.current_text(path).unwrap_or_default()
    }

    fn open(&self, path: &str, code: &str) {
        self.buffers
            .0
            .lock()
            .insert(path.to_string(), code.to_string());
        self.session.open_file(path, code).expect("Failed to open");
    }

    fn edit(&self, path: &str, offset: usize, inserted: &str, removed: usize) {
        let current = self.text(path);
        let deleted: String = current.chars().skip(offset).take(removed).collect();
        self.session.text_changed(TextChange {
            path: path.to_string(),
            offset,
            inserted: inserted.to_string(),
            deleted,
            time: now_millis(),
        });
        let updated = splice(&current, offset, removed, inserted).expect("Bad edit");
        self.buffers.0.lock().insert(path.to_string(), updated);
    }

    fn type_text(&self, path: &str, offset: usize, text: &str) {
        for (i, c) in text.chars().enumerate() {
            self.edit(path, offset + i, &c.to_string(), 0);
        }
    }

    fn store(&self) -> HistoryStore {
        HistoryStore::new(self.session.history_dir())
    }
}

fn initial_code(ops: &[Operation]) -> String {
    ops.iter()
        .find_map(|op| match op {
            Operation::File(file) if file.action == FileAction::Open => file.code.clone(),
            _ => None,
        })
        .unwrap_or_default()
}

#[test]
fn test_session_replays_to_saved_text() {
    let shell = Shell::new();
    shell.open("/Main.java", "class Main {}\n");
    shell.type_text("/Main.java", 12, "\n  int x;\n");
    shell.edit("/Main.java", 19, "", 1);
    shell.type_text("/Main.java", 19, "y");

    let code = shell.text("/Main.java");
    let saved = shell
        .session
        .save_file("/Main.java", &code, Some("UTF-8"))
        .expect("Failed to save")
        .expect("Nothing written");
    assert!(saved.exists());
    assert!(shell.session.pending_history().is_empty());

    let history = shell.store().read_all().expect("Failed to read");
    let ops = history.filter_by_path("/Main.java").into_operations();
    let restored = replay(&initial_code(&ops), &ops).expect("Failed to replay");
    assert_eq!(restored, code);
    assert_eq!(restored, "class Main {\n  int y;\n}\n");
}

#[test]
fn test_trivial_session_is_not_persisted() {
    let shell = Shell::new();
    shell.open("/a.txt", "unchanged");
    shell.session.activate_file("/a.txt");

    let written = shell
        .session
        .close_file("/a.txt", "unchanged", None)
        .expect("Failed to close");
    assert!(written.is_none());
    assert!(shell.store().files().expect("Failed to list").is_empty());
}

#[test]
fn test_close_flushes_pending_typing() {
    let shell = Shell::new();
    shell.open("/a.txt", "");
    shell.type_text("/a.txt", 0, "abc");

    let written = shell
        .session
        .close_file("/a.txt", "abc", None)
        .expect("Failed to close")
        .expect("Nothing written");

    let history = shell.store().read(&written).expect("Failed to read");
    let ops = history.operations();
    assert!(matches!(ops.last(), Some(Operation::File(f)) if f.action == FileAction::Close));
    assert_eq!(replay("", ops).expect("Failed to replay"), "abc");
}

#[test]
fn test_deleting_closed_file_records_lost_text() {
    let shell = Shell::new();
    shell.open("/gone.txt", "");
    shell.type_text("/gone.txt", 0, "bye");
    shell
        .session
        .close_file("/gone.txt", "bye", None)
        .expect("Failed to close");

    shell.session.resource_changed(ResourceChange {
        path: "/gone.txt".to_string(),
        kind: ResourceAction::Removed,
        target: ResourceTarget::File,
        identical_path: String::new(),
        code: Some("bye".to_string()),
        encoding: Some("UTF-8".to_string()),
        time: now_millis(),
    });

    let history = shell.store().read_all().expect("Failed to read");
    let last = history.last().expect("Empty history");
    assert!(matches!(last, Operation::File(f) if f.action == FileAction::Delete));

    let ops = history.operations();
    assert_eq!(replay("", ops).expect("Failed to replay"), "");
    assert!(!shell.session.recorder().registry().contains("/gone.txt"));
}
