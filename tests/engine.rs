// Integration tests driving the public API end-to-end against synthetic
// ComLib corpora written to a temp directory.

use std::io::Write;

use logsleuth_analyzer::flavor::Flavor;
use logsleuth_analyzer::repo::LinesRepo;

fn write_file(dir: &std::path::Path, name: &str, contents: &str) {
    let mut f = std::fs::File::create(dir.join(name)).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
}

const TASK_LOG: &str = "\
2024-01-01 12:00:00.000 100 |INFO    |-1|COMLib.Scheduler:run| task scheduled |id=7; name=sync
2024-01-01 12:00:00.010 100 |INFO    |-1|COMLib.Scheduler:run| task executing |id=7
2024-01-01 12:00:00.020 200 |INFO    |-1|COMLib.Net:send| sending payload |id=7
2024-01-01 12:00:00.030 200 |INFO    |-1|COMLib.Scheduler:run| task finishing |id=7
2024-01-01 12:00:00.040 100 |INFO    |-1|COMLib.Scheduler:run| task finished |id=7
2024-01-01 12:00:00.050 300 |INFO    |-1|COMLib.Other:x| unrelated line |foo=bar
";

#[test]
fn task_execution_spans_thread_migration() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "comlib.000.log", TASK_LOG);

    let repo = LinesRepo::init_from_folder(dir.path(), Flavor::ComLib, None).unwrap();
    assert_eq!(repo.num_lines(), 6);

    let mut params = logsleuth_analyzer::CommandParams::new();
    params.insert("task".to_string(), "7".to_string());
    let result = repo.execute_command("Task execution", None, &params);
    assert!(result.executed, "command is registered");

    let indices: Vec<usize> = result
        .lines_indices
        .iter()
        .flat_map(|group| group.indices.iter().copied())
        .collect();

    // every ComLib.Scheduler line for id=7 plus the cross-thread body between
    // "task executing" and the next scheduler event should be included
    assert!(indices.contains(&0));
    assert!(indices.contains(&1));
    assert!(indices.contains(&2)); // migrated to thread 200
    assert!(indices.contains(&3));
    assert!(indices.contains(&4));
    assert!(!indices.contains(&5));
}

#[test]
fn search_cursor_resumes_from_prior_hit() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "comlib.000.log", TASK_LOG);
    let repo = LinesRepo::init_from_folder(dir.path(), Flavor::ComLib, None).unwrap();

    let bytes_of = repo.bytes_resolver();
    let first = logsleuth_analyzer::line_tools::window_find_first(
        repo.lines(),
        &bytes_of,
        repo.full_range(),
        b"id=7",
    )
    .unwrap();
    assert_eq!(first.line_index, 0);

    let resumed = logsleuth_analyzer::line_tools::window_find_first(
        repo.lines(),
        &bytes_of,
        logsleuth_analyzer::model::LineIndexRange::new(first.line_index + 1, repo.num_lines()),
        b"id=7",
    )
    .unwrap();
    assert_eq!(resumed.line_index, 1);
}

#[test]
fn continuation_lines_extend_the_previous_record() {
    let dir = tempfile::tempdir().unwrap();
    let log = "2024-01-01 12:00:00.000 100 |INFO    |-1|COMLib.Other:x| multi |a=1\nstray continuation text\n";
    write_file(dir.path(), "comlib.000.log", log);

    let repo = LinesRepo::init_from_folder(dir.path(), Flavor::ComLib, None).unwrap();
    assert_eq!(repo.num_lines(), 1);
    let line = repo.line(0).unwrap();
    let bytes = repo.bytes_for(line);
    assert!(line.raw(bytes).ends_with(b"stray continuation text"));
}

#[test]
fn tag_tree_counts_every_ancestor() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "comlib.000.log", TASK_LOG);
    let repo = LinesRepo::init_from_folder(dir.path(), Flavor::ComLib, None).unwrap();

    let tree = repo.tag_tree();
    let comlib_node = tree.iter().find(|n| n.name == "COMLib").unwrap();
    // Scheduler (4), Net (1), Other (1) => 6 lines total under COMLib
    assert_eq!(comlib_node.count, 6);
    let scheduler = comlib_node
        .descendants
        .iter()
        .find(|n| n.name == "Scheduler")
        .unwrap();
    assert_eq!(scheduler.count, 4);
}

#[test]
fn rejects_non_directory_source() {
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("not-a-dir.log");
    std::fs::write(&file_path, "x").unwrap();

    let err = LinesRepo::init_from_folder(&file_path, Flavor::ComLib, None).unwrap_err();
    assert!(matches!(err, logsleuth_analyzer::EngineError::Repo(_)));
}
