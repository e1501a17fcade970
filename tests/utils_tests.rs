use kuml::utils::{file_walker, table};
use std::fs;
use std::io::Write;
use tempfile::tempdir;

#[test]
fn table_renderer_produces_expected_grid() {
    let headers = ["A", "B"];
    let rows = vec![vec!["x".into(), "y".into()], vec!["long".into(), "z".into()]];
    let out = table::render(&headers, &rows);
    assert!(out.starts_with('+'));
    assert!(out.contains("| A    | B |"));
    assert!(out.contains("| long | z |"));
}

#[test]
fn table_renderer_flattens_multiline_cells() {
    let rows = vec![vec!["app : web\ntier : front".to_string()]];
    let out = table::render(&["Label"], &rows);
    assert!(out.contains("| app : web, tier : front |"));
    assert_eq!(out.lines().count(), 5);
}

#[test]
fn file_walker_respects_ignore_and_no_ignore() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    write(&root.join("app.yaml"), "kind: Pod\n");
    write(&root.join("secret.yaml"), "kind: Secret\n");
    write(&root.join("notes.txt"), "not a manifest\n");
    write(&root.join(".gitignore"), "secret.yaml\n");

    // Default: should not see secret.yaml or non-YAML files
    let files = file_walker::manifest_files(root, false, false);
    assert!(files.iter().any(|p| p.ends_with("app.yaml")));
    assert!(!files.iter().any(|p| p.ends_with("secret.yaml")));
    assert!(!files.iter().any(|p| p.ends_with("notes.txt")));

    // no_ignore=true: should include secret.yaml
    let files_all = file_walker::manifest_files(root, false, true);
    assert!(files_all.iter().any(|p| p.ends_with("secret.yaml")));
}

#[test]
fn file_walker_descends_only_when_recursive() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("nested/deeper")).unwrap();

    write(&root.join("b.yml"), "kind: Pod\n");
    write(&root.join("a.yaml"), "kind: Pod\n");
    write(&root.join("nested/deeper/c.YAML"), "kind: Pod\n");

    let flat = file_walker::manifest_files(root, false, false);
    assert_eq!(flat.len(), 2);
    assert!(flat[0].ends_with("a.yaml"));
    assert!(flat[1].ends_with("b.yml"));

    let deep = file_walker::manifest_files(root, true, false);
    assert_eq!(deep.len(), 3);
    assert!(deep.iter().any(|p| p.ends_with("nested/deeper/c.YAML")));
}

fn write(path: &std::path::Path, s: &str) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(s.as_bytes()).unwrap();
}
