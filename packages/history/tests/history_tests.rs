//! End-to-end tests: build a history, persist it, reload it and replay it.

use editlog_history::{
    apply_operation, apply_operation_reversely, read_history, replay, restore_at, write_history,
    CodecError, CompoundOperation, EditAction, FileAction, FileOperation, NormalOperation,
    Operation, OperationHistory,
};
use proptest::prelude::*;
use tempfile::TempDir;

fn edit(time: i64, offset: usize, ins: &str, del: &str) -> Operation {
    NormalOperation::new(time, "/src/Main.java", offset, ins, del, EditAction::Edit).into()
}

#[test]
fn test_write_read_replay() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history").join("1000.json");

    let mut history = OperationHistory::new();
    history.append(
        FileOperation::new(1000, "/src/Main.java", FileAction::Open, Some(String::new())).into(),
    );
    history.append(edit(1001, 0, "class Main {\n", ""));
    history.append(edit(1002, 13, "}\n", ""));
    history.append(
        CompoundOperation::new(
            1003,
            "Refactoring",
            vec![edit(1003, 6, "App", "Main")],
        )
        .into(),
    );

    write_history(&history, &path).unwrap();
    let reloaded = read_history(&path).unwrap();
    assert_eq!(reloaded, history);

    let code = replay("", reloaded.operations()).unwrap();
    assert_eq!(code, "class App {\n}\n");
    assert_eq!(
        restore_at(&reloaded, "/src/Main.java", "", 3).unwrap(),
        "class Main {\n}\n"
    );
}

#[test]
fn test_write_refuses_empty_history() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");

    let result = write_history(&OperationHistory::new(), &path);
    assert!(matches!(result, Err(CodecError::EmptyHistory)));
    assert!(!path.exists());
}

#[test]
fn test_read_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = read_history(&dir.path().join("nope.json"));
    assert!(matches!(result, Err(CodecError::Io(_))));
}

#[test]
fn test_read_garbage_yields_no_history() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.json");
    std::fs::write(&path, "<OperationHistory version=\"1.0a\">").unwrap();

    assert!(matches!(read_history(&path), Err(CodecError::Malformed(_))));
}

fn arb_edit_on(buffer: String) -> impl Strategy<Value = (String, Operation)> {
    let len = buffer.chars().count();
    (0..=len, "[a-z;\n ]{0,6}").prop_flat_map(move |(offset, inserted)| {
        let buffer = buffer.clone();
        let remaining = len - offset;
        (0..=remaining).prop_map(move |removed| {
            let deleted: String = buffer.chars().skip(offset).take(removed).collect();
            (buffer.clone(), edit(0, offset, &inserted, &deleted))
        })
    })
}

/// Chain edits into one compound, each valid against the buffer the
/// previous ones leave behind
fn chained_compound(buffer: &str, seeds: &[(usize, String, usize)]) -> Operation {
    let mut current = buffer.to_string();
    let mut leaves = Vec::new();
    for (offset_seed, inserted, removed_seed) in seeds {
        let len = current.chars().count();
        let offset = offset_seed % (len + 1);
        let removed = removed_seed % (len - offset + 1);
        let deleted: String = current.chars().skip(offset).take(removed).collect();

        let leaf = edit(0, offset, inserted, &deleted);
        current = apply_operation(&current, &leaf).unwrap();
        leaves.push(leaf);
    }
    CompoundOperation::new(0, "Diff", leaves).into()
}

proptest! {
    #[test]
    fn prop_reverse_replay_restores_buffer(
        (buffer, op) in "[a-zé{}\n]{0,20}".prop_flat_map(arb_edit_on)
    ) {
        let applied = apply_operation(&buffer, &op).unwrap();
        let restored = apply_operation_reversely(&applied, &op).unwrap();
        prop_assert_eq!(restored, buffer);
    }

    #[test]
    fn prop_reverse_replay_restores_buffer_through_compound(
        buffer in "[a-zé{}\n]{0,20}",
        seeds in prop::collection::vec((0usize..64, "[a-z;\n ]{0,4}", 0usize..8), 1..8)
    ) {
        let compound = chained_compound(&buffer, &seeds);
        let applied = apply_operation(&buffer, &compound).unwrap();
        let restored = apply_operation_reversely(&applied, &compound).unwrap();
        prop_assert_eq!(restored, buffer);
    }

    #[test]
    fn prop_sorted_history_is_ordered(times in prop::collection::vec(0i64..5, 1..40)) {
        let mut history = OperationHistory::new();
        for time in &times {
            history.append(edit(*time, 0, "x", ""));
        }
        history.sort();

        for pair in history.operations().windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.time() < b.time() || (a.time() == b.time() && a.seq() < b.seq()));
        }
    }
}
