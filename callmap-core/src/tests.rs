//! End-to-end test suite for callmap-core.

use crate::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn write_file(file: &Path, content: &str) {
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

fn setup_temp_project() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir()
        .join("callmap_tests")
        .join(format!("{}_{}", timestamp, id));

    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn names(set: &BTreeSet<String>) -> Vec<&str> {
    set.iter().map(String::as_str).collect()
}

fn callees<'a>(analysis: &'a Analysis, caller: &str) -> Vec<&'a str> {
    analysis
        .relation
        .get(caller)
        .map(|set| set.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

const PROFILE_TSX: &str = r#"import React from "react";
import { fetchUser } from "./api";

interface Props { id: string }

@observer
class Store {
  load() { return helper(); }
}

export const Profile = ({ id }: Props) => {
  const user = useUser(id);
  return <div onClick={() => track(id)}>{format(user)}</div>;
};

function useUser(id: string) {
  return fetchUser(id);
}

function format(u: unknown): string {
  return String(u);
}

function track(id: string) {
  console.log(id);
}

function helper() {}
"#;

// Core Test 1: No functions means nothing at all
#[test]
fn test_source_without_functions_is_empty() {
    for src in ["", "const x = 1;\nconsole.log(x);\n", "items.forEach((i) => show(i));"] {
        let analysis = analyze(src).unwrap();
        assert!(analysis.catalog.is_empty());
        assert!(analysis.relation.is_empty());
        assert!(analysis.roots.is_empty());
        assert!(analysis.dead.is_empty());
    }
}

// Core Test 2: Simple chain from the design notes
#[test]
fn test_simple_chain() {
    let analysis = analyze("function a(){ b(); }\nfunction b(){ console.log(1); }").unwrap();

    assert_eq!(callees(&analysis, "a"), vec!["b"]);
    assert_eq!(analysis.relation.len(), 1);
    assert_eq!(names(&analysis.roots), vec!["a"]);
    assert_eq!(names(&analysis.dead), vec!["a"]);
    assert_eq!(analysis.catalog.get("a").unwrap().line_count, 1);
    assert_eq!(analysis.catalog.get("b").unwrap().line_count, 1);
}

// Core Test 3: Mutual recursion terminates and has no roots
#[test]
fn test_mutual_recursion() {
    let analysis = analyze("function x(){ y(); }\nfunction y(){ x(); }").unwrap();

    assert_eq!(callees(&analysis, "x"), vec!["y"]);
    assert_eq!(callees(&analysis, "y"), vec!["x"]);
    assert!(analysis.roots.is_empty());
    assert!(analysis.dead.is_empty());
}

// Core Test 4: Line counts skip blank lines and stay within the span
#[test]
fn test_line_count_bounds() {
    let src = "function f() {\n  one();\n\n  two();\n}\n\nconst g = () => {\n\n\n  return 1;\n};\n";
    let analysis = analyze(src).unwrap();

    let f = analysis.catalog.get("f").unwrap();
    assert_eq!(f.defining_line, 1);
    assert_eq!(f.line_count, 4);

    for record in analysis.catalog.records() {
        assert!(record.line_count >= 1);
        assert!(record.line_count <= record.node.line_span());
    }
    assert_eq!(analysis.catalog.get("g").unwrap().line_count, 3);
}

// Core Test 5: Roots and dead functions are the same set by default
#[test]
fn test_roots_equal_dead_by_default() {
    let sources = [
        "function a(){ b(); }\nfunction b(){ c(); }\nfunction c(){}\nfunction d(){}",
        "function x(){ y(); }\nfunction y(){ x(); }\nfunction z(){ x(); }",
        PROFILE_TSX,
    ];
    for src in sources {
        let analysis = analyze(src).unwrap();
        assert_eq!(analysis.roots, analysis.dead);
    }
}

// Core Test 6: Denylisted names never become callees, even when catalogued
#[test]
fn test_denylist_beats_catalog() {
    let src = "function map(list) { return list; }\nfunction run(xs) { map(xs); xs.map(map); }";
    let analysis = analyze(src).unwrap();

    assert!(analysis.catalog.contains("map"));
    assert!(callees(&analysis, "run").is_empty());
    assert_eq!(names(&analysis.roots), vec!["map", "run"]);
}

// Core Test 7: A substituted denylist changes the result
#[test]
fn test_custom_denylist() {
    let src = "function map(list) { return list; }\nfunction run(xs) { map(xs); }";
    let config = AnalysisConfig::default().with_denylist(Denylist::empty());
    let analysis = analyze_with(src, &config).unwrap();
    assert_eq!(callees(&analysis, "run"), vec!["map"]);

    let config = AnalysisConfig::default().with_denylist(Denylist::builtin().extended(["run2"]));
    let src = "function run(){ run2(); }\nfunction run2(){}";
    assert!(analyze_with(src, &config).unwrap().relation.is_empty());
}

// Core Test 8: Calls to imported or external functions are dropped
#[test]
fn test_uncatalogued_calls_dropped() {
    let src = "import { util } from './util';\nfunction a(){ util(); fetch('/x'); window.alert('x'); }";
    let analysis = analyze(src).unwrap();
    assert!(analysis.relation.is_empty());
    assert_eq!(names(&analysis.roots), vec!["a"]);
}

// Core Test 9: Two runs over the same text are identical
#[test]
fn test_idempotence() {
    let first = analyze(PROFILE_TSX).unwrap();
    let second = analyze(PROFILE_TSX).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

// Core Test 10: Parse failures return no partial analysis
#[test]
fn test_parse_failure() {
    for src in ["function broken( {", "const = 1;", "if (x {"] {
        match analyze(src) {
            Err(CallmapError::Parse { line, column, .. }) => {
                assert!(line >= 1 && column >= 1);
            }
            other => panic!("Expected Parse error for {:?}, got {:?}", src, other),
        }
    }
}

// Extended Test 1: TypeScript, JSX and decorators in one file
#[test]
fn test_tsx_component_file() {
    let analysis = analyze(PROFILE_TSX).unwrap();

    let catalogued: Vec<&str> = analysis.catalog.names().collect();
    assert_eq!(catalogued, vec!["Profile", "format", "helper", "track", "useUser"]);
    assert_eq!(callees(&analysis, "Profile"), vec!["format", "useUser"]);
    assert_eq!(analysis.relation.len(), 1);
    assert_eq!(names(&analysis.roots), vec!["Profile", "helper", "track"]);
    assert_eq!(analysis.roots_with_calls().collect::<Vec<_>>(), vec!["Profile"]);
    assert_eq!(analysis.catalog.get("Profile").unwrap().defining_line, 11);
}

// Extended Test 2: Member calls conflate with top-level names
#[test]
fn test_member_call_conflation() {
    let src = "function save(){}\nfunction run(db){ db.save(); db?.save(); }";
    let analysis = analyze(src).unwrap();
    assert_eq!(callees(&analysis, "run"), vec!["save"]);
}

// Extended Test 3: Duplicate names follow the configured policy
#[test]
fn test_duplicate_policies() {
    let src = "function init(){ a(); }\nfunction a(){}\nfunction b(){}\nconst init = () => b();";

    let analysis = analyze(src).unwrap();
    let init = analysis.catalog.get("init").unwrap();
    assert_eq!(init.defining_line, 4);
    assert_eq!(init.kind, FunctionKind::Arrow);
    // Calls from both definitions are attributed to the one name
    assert_eq!(callees(&analysis, "init"), vec!["a", "b"]);

    let reject = AnalysisConfig::default().with_duplicates(DuplicatePolicy::Reject);
    assert!(matches!(
        analyze_with(src, &reject),
        Err(CallmapError::DuplicateName {
            ref name,
            first_line: 1,
            second_line: 4,
        }) if name == "init"
    ));
}

// Extended Test 4: Reachability policy catches orphan cycles
#[test]
fn test_unreachable_from_roots_policy() {
    let src = "function main(){ go(); }\nfunction go(){}\nfunction ping(){ pong(); }\nfunction pong(){ ping(); }";
    let config = AnalysisConfig::default().with_dead_code(DeadCodePolicy::UnreachableFromRoots);
    let analysis = analyze_with(src, &config).unwrap();

    assert_eq!(names(&analysis.roots), vec!["main"]);
    assert_eq!(names(&analysis.dead), vec!["ping", "pong"]);
    assert_eq!(analysis.stats.dead, 2);
}

// Extended Test 5: Export and DOT omit functions without edges
#[test]
fn test_export_and_dot() {
    let src = "function main(){ load(); }\nfunction load(){ decode(); }\nfunction decode(){}\nfunction lonely(){}";
    let analysis = analyze(src).unwrap();
    let graph = analysis.export();

    let nodes: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(nodes, vec!["load", "main"]);
    assert_eq!(graph.edges.len(), 2);
    assert_eq!(graph.isolated.len(), 1);
    assert_eq!(graph.isolated[0].name, "main");

    let dot = generate_dot(&graph);
    assert!(dot.contains("\"main\\n1 lines\\nline 1\" -> \"load\\n1 lines\\nline 2\";"));
    assert!(dot.contains("\"load\\n1 lines\\nline 2\" -> \"decode\\n1 lines\\nline 3\";"));
    assert!(!dot.contains("lonely"));
}

// Extended Test 6: Directory batch with one broken file
#[test]
fn test_batch_directory() {
    let root = setup_temp_project();
    write_file(&root.join("src/app.js"), "function main(){ run(); }\nfunction run(){}\n");
    write_file(
        &root.join("src/view.tsx"),
        "export const View = () => <p>{label()}</p>;\nfunction label(){ return 'x'; }\n",
    );
    write_file(&root.join("src/broken.ts"), "function (\n");
    write_file(&root.join("node_modules/lib/index.js"), "function (");
    write_file(&root.join("README.md"), "# readme");

    let files = gather_source_files(&root).unwrap();
    assert_eq!(files.len(), 3);

    let results = analyze_files_parallel(&files, &AnalysisConfig::default());
    assert_eq!(results.len(), 3);

    let failed: Vec<&FileAnalysis> = results.iter().filter(|r| r.result.is_err()).collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].path.ends_with("broken.ts"));

    let view = results
        .iter()
        .find(|r| r.path.ends_with("view.tsx"))
        .and_then(|r| r.result.as_ref().ok())
        .unwrap();
    assert_eq!(callees(view, "View"), vec!["label"]);
}

// Extended Test 7: Config file drives the analysis
#[test]
fn test_config_file_drives_analysis() {
    let root = setup_temp_project();
    write_file(
        &root.join(CONFIG_FILE_NAME),
        "[analysis]\nallow = [\"parse\"]\ndead_code = \"unreachable-from-roots\"\n",
    );
    let config = load_config(&root).unwrap().unwrap().analysis_config();

    let src = "function main(){ parse(); }\nfunction parse(){}\nfunction a(){ b(); }\nfunction b(){ a(); }";
    let analysis = analyze_with(src, &config).unwrap();
    assert_eq!(callees(&analysis, "main"), vec!["parse"]);
    assert_eq!(names(&analysis.dead), vec!["a", "b"]);
}

// Extended Test 8: Missing files surface as I/O errors with the path
#[test]
fn test_missing_file_is_io_error() {
    let root = setup_temp_project();
    let missing = root.join("nope.js");
    let err = analyze_file(&missing, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, CallmapError::Io { .. }));
    assert_eq!(err.path(), Some(&missing));
    assert!(err.is_recoverable());
}

// Extended Test 9: Rewrite leaves the analysis of the remaining code intact
#[cfg(feature = "rewrite")]
#[test]
fn test_rewrite_then_reanalyze() {
    let src = "function main(){ keep(); }\n\nfunction keep(){}\n\nfunction legacy(){ keep(); }\n";
    let tree = parse_source(src).unwrap();
    let analysis = analyze_tree(&tree, &AnalysisConfig::default()).unwrap();
    assert_eq!(names(&analysis.roots), vec!["legacy", "main"]);

    let result = remove_functions(&tree, &analysis.catalog, &["legacy"]).unwrap();
    let after = analyze(&result.source).unwrap();
    assert_eq!(names(&after.roots), vec!["main"]);
    assert_eq!(after.catalog.len(), 2);
}
