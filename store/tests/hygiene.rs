//! Source hygiene for the store crate.
//!
//! Scans production files under `src/` (sibling `_test.rs` files excluded)
//! for patterns the project keeps out of shipped code. Each pattern has a
//! budget; budgets only ever go down.

use std::fs;
use std::path::{Path, PathBuf};

struct Budget {
    pattern: &'static str,
    max: usize,
    why: &'static str,
}

const BUDGETS: &[Budget] = &[
    Budget { pattern: ".unwrap()", max: 0, why: "aborts the caller instead of degrading to a default" },
    Budget { pattern: ".expect(", max: 0, why: "aborts the caller instead of degrading to a default" },
    Budget { pattern: "panic!(", max: 0, why: "aborts the caller instead of degrading to a default" },
    Budget { pattern: "unreachable!(", max: 0, why: "aborts the caller instead of degrading to a default" },
    Budget { pattern: "todo!(", max: 0, why: "unfinished stub" },
    Budget { pattern: "unimplemented!(", max: 0, why: "unfinished stub" },
    Budget { pattern: "let _ =", max: 0, why: "discards a result without looking at it" },
    Budget { pattern: ".ok()", max: 0, why: "drops the error instead of logging it" },
    Budget { pattern: "#[allow(dead_code)]", max: 0, why: "hides unused code" },
    Budget { pattern: "println!(", max: 0, why: "log through tracing" },
    Budget { pattern: "eprintln!(", max: 0, why: "log through tracing" },
    Budget { pattern: "dbg!(", max: 0, why: "debugging leftover" },
];

fn production_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            production_files(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs")
            && !path.to_string_lossy().ends_with("_test.rs")
        {
            out.push(path);
        }
    }
}

fn hits(pattern: &str) -> Vec<(String, usize)> {
    let mut files = Vec::new();
    production_files(Path::new("src"), &mut files);
    files.sort();
    files
        .iter()
        .filter_map(|path| {
            let content = fs::read_to_string(path).ok()?;
            let count = content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (path.display().to_string(), count))
        })
        .collect()
}

#[test]
fn source_tree_is_not_empty() {
    let mut files = Vec::new();
    production_files(Path::new("src"), &mut files);
    assert!(files.iter().any(|p| p.ends_with("lib.rs")), "run from the crate root");
}

#[test]
fn budgets_hold() {
    let mut failures = Vec::new();
    for budget in BUDGETS {
        let found = hits(budget.pattern);
        let count: usize = found.iter().map(|(_, c)| c).sum();
        if count > budget.max {
            let listing: Vec<String> = found.iter().map(|(path, c)| format!("    {path}: {c}")).collect();
            failures.push(format!(
                "`{}` found {count}, max {} ({})\n{}",
                budget.pattern,
                budget.max,
                budget.why,
                listing.join("\n")
            ));
        }
    }
    assert!(failures.is_empty(), "hygiene budgets exceeded:\n{}", failures.join("\n"));
}
