//! Recording scenarios driven through the public API, plus properties of
//! the compressor and the reconciliation engine.

use std::collections::HashMap;
use std::sync::Arc;

use editlog_common::{char_len, splice};
use editlog_recorder::{
    CompoundAssembler, DiffMacroGenerator, DocumentMacro, DocumentSource, EditType,
    MacroCompressor, MacroListener, Macro, Recorder, TextChange, TriggerMacro, UndoNotification,
    UndoPhase,
};
use parking_lot::Mutex;
use proptest::prelude::*;

#[derive(Default)]
struct Buffers(Mutex<HashMap<String, String>>);

impl DocumentSource for Buffers {
    fn current_text(&self, path: &str) -> Option<String> {
        self.0.lock().get(path).cloned()
    }
}

#[derive(Default)]
struct Finalized(Mutex<Vec<Macro>>);

impl MacroListener for Finalized {
    fn macro_added(&self, m: &Macro) {
        self.0.lock().push(m.clone());
    }
}

struct Editor {
    buffers: Arc<Buffers>,
    recorder: Recorder,
    path: String,
    clock: i64,
}

impl Editor {
    fn open(path: &str, code: &str, listener: Arc<Finalized>) -> Self {
        let buffers = Arc::new(Buffers::default());
        buffers.0.lock().insert(path.to_string(), code.to_string());
        let recorder = Recorder::new(buffers.clone());
        recorder.add_listener(listener);
        recorder.start_editor(path).unwrap();
        Self {
            buffers,
            recorder,
            path: path.to_string(),
            clock: 0,
        }
    }

    fn text(&self) -> String {
        self.buffers.current_text(&self.path).unwrap()
    }

    fn type_at(&mut self, offset: usize, inserted: &str, removed: usize) {
        let current = self.text();
        let deleted: String = current.chars().skip(offset).take(removed).collect();
        self.clock += 1;
        self.recorder.text_changed(TextChange {
            path: self.path.clone(),
            offset,
            inserted: inserted.to_string(),
            deleted,
            time: self.clock,
        });
        let updated = splice(&current, offset, removed, inserted).unwrap();
        self.buffers.0.lock().insert(self.path.clone(), updated);
    }

    fn undo(&mut self, phase: UndoPhase) {
        self.clock += 1;
        self.recorder.undo_notification(UndoNotification {
            path: self.path.clone(),
            phase,
            time: self.clock,
        });
    }
}

fn apply_all(text: &str, macros: &[&DocumentMacro]) -> String {
    macros.iter().fold(text.to_string(), |text, m| {
        splice(&text, m.offset, char_len(&m.deleted), &m.inserted).unwrap()
    })
}

fn leaves(macros: &[Macro]) -> Vec<&DocumentMacro> {
    let mut out = Vec::new();
    for m in macros {
        match m {
            Macro::Document(dm) => out.push(dm),
            Macro::Compound(c) => out.extend(leaves(&c.macros)),
            _ => {}
        }
    }
    out
}

#[test]
fn test_typing_session_reproduces_buffer() {
    let listener = Arc::new(Finalized::default());
    let mut editor = Editor::open("/Main.java", "", listener.clone());

    for (i, c) in "class A {".chars().enumerate() {
        editor.type_at(i, &c.to_string(), 0);
    }
    editor.type_at(9, "\n", 0);
    for (i, c) in "int x;".chars().enumerate() {
        editor.type_at(10 + i, &c.to_string(), 0);
    }
    // Backspace over "x;" and retype
    editor.type_at(15, "", 1);
    editor.type_at(14, "", 1);
    editor.type_at(14, "y;", 0);
    editor.recorder.break_macro();

    let finalized = listener.0.lock();
    assert_eq!(apply_all("", &leaves(&finalized)), editor.text());
    assert!(finalized.len() < editor.text().len());
}

#[test]
fn test_scenario_ab_then_newline() {
    let listener = Arc::new(Finalized::default());
    let mut editor = Editor::open("/a", "", listener.clone());

    editor.type_at(0, "a", 0);
    editor.type_at(1, "b", 0);
    editor.type_at(2, "\n", 0);

    let finalized = listener.0.lock();
    assert_eq!(finalized.len(), 2);
    let first = finalized[0].as_document().unwrap();
    assert_eq!((first.offset, first.inserted.as_str()), (0, "ab"));
    assert_eq!(first.kind, EditType::Typing);
    assert_eq!(finalized[1].as_document().unwrap().inserted, "\n");
}

#[test]
fn test_undo_redo_compounds() {
    let listener = Arc::new(Finalized::default());
    let mut editor = Editor::open("/a", "x", listener.clone());

    editor.undo(UndoPhase::AboutToUndo);
    editor.type_at(0, "", 1);
    editor.undo(UndoPhase::Undone);
    editor.undo(UndoPhase::AboutToRedo);
    editor.type_at(0, "x", 0);
    editor.undo(UndoPhase::Redone);

    let finalized = listener.0.lock();
    let labels: Vec<&str> = finalized
        .iter()
        .filter_map(|m| match m {
            Macro::Compound(c) => Some(c.label.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec!["Undo", "Redo"]);
}

#[test]
fn test_scenario_undo_cancels_refactor_child() {
    let mut assembler = CompoundAssembler::new();
    assembler.record(Macro::Trigger(TriggerMacro::begin(1, "Refactor", "/a")));
    assembler.record(Macro::Document(DocumentMacro::new(
        2,
        EditType::Typing,
        "/a",
        3,
        "new",
        "old",
    )));
    assembler.record(Macro::Trigger(TriggerMacro::begin(3, "Undo", "/a")));
    assembler.record(Macro::Cancel(DocumentMacro::new(
        4,
        EditType::Undo,
        "/a",
        3,
        "old",
        "new",
    )));

    let closed = assembler.record(Macro::Trigger(TriggerMacro::end(5, "Undo", "/a")));
    assert_eq!(closed, editlog_recorder::Assembled::Discarded);
}

fn word() -> impl Strategy<Value = String> {
    "[a-z ]{1,4}"
}

proptest! {
    #[test]
    fn prop_reconcile_round_trip(
        old in "[a-c;{}\n é]{0,40}",
        new in "[a-c;{}\n é]{0,40}",
        cost in 0usize..8,
    ) {
        let macros = DiffMacroGenerator::new(cost).generate(0, "/a", &old, &new);
        let refs: Vec<&DocumentMacro> = macros.iter().collect();
        prop_assert_eq!(apply_all(&old, &refs), new);
    }

    #[test]
    fn prop_insert_fusion_is_associative(
        offset in 0usize..20,
        a in word(),
        b in word(),
        c in word(),
    ) {
        let compressor = MacroCompressor::new();
        let ma = DocumentMacro::new(1, EditType::Typing, "/a", offset, a.clone(), "");
        let mb = DocumentMacro::new(2, EditType::Typing, "/a", offset + a.len(), b.clone(), "");
        let mc = DocumentMacro::new(3, EditType::Typing, "/a", offset + a.len() + b.len(), c, "");

        let left = compressor
            .combine(compressor.combine(Some(&ma), &mb).as_ref(), &mc)
            .unwrap();
        let right = compressor
            .combine(Some(&ma), &compressor.combine(Some(&mb), &mc).unwrap())
            .unwrap();
        prop_assert_eq!(left, right);
    }

    #[test]
    fn prop_backspace_fusion_is_associative(
        a in word(),
        b in word(),
        c in word(),
    ) {
        let compressor = MacroCompressor::new();
        let start = 20;
        let ma = DocumentMacro::new(1, EditType::Typing, "/a", start, "", a);
        let mb = DocumentMacro::new(2, EditType::Typing, "/a", start - b.len(), "", b.clone());
        let mc = DocumentMacro::new(
            3,
            EditType::Typing,
            "/a",
            start - b.len() - c.len(),
            "",
            c,
        );

        let left = compressor
            .combine(compressor.combine(Some(&ma), &mb).as_ref(), &mc)
            .unwrap();
        let right = compressor
            .combine(Some(&ma), &compressor.combine(Some(&mb), &mc).unwrap())
            .unwrap();
        prop_assert_eq!(left, right);
    }
}
