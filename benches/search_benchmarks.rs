//! Criterion benchmarks for search engine core operations.
//!
//! Run with: `cargo bench`
//!
//! Benchmarks build a synthetic source tree in a temp directory so results
//! are reproducible across machines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fs;
use std::path::Path;

use sandgrep::matcher::{context_window, QueryMatcher};
use sandgrep::resolver::resolve_path;
use sandgrep::{search, Sandbox, ScoreWeights, SearchRequest};

// ─── Helpers ─────────────────────────────────────────────────────────

const SAMPLE_MODULE: &str = r#"import os
import sys
from typing import Optional

class Calculator:
    def __init__(self):
        self.operators = {"+": lambda a, b: a + b, "-": lambda a, b: a - b}
        self.precedence = {"+": 1, "-": 1}

    def evaluate(self, expression: str) -> Optional[float]:
        if not expression or expression.isspace():
            return None
        tokens = expression.strip().split()
        return self._evaluate_infix(tokens)

    def _evaluate_infix(self, tokens):
        values = []
        operators = []
        for token in tokens:
            if token in self.operators:
                operators.append(token)
            else:
                values.append(float(token))
        return values[0] if values else None
"#;

/// Create `num_files` Python modules spread over 20 packages, plus an ignored
/// `.git` directory and a `node_modules` directory of the same size.
fn build_tree(root: &Path, num_files: usize) {
    for i in 0..num_files {
        let dir = root.join(format!("pkg_{}", i % 20));
        fs::create_dir_all(&dir).unwrap();
        let body = if i % 50 == 0 {
            format!("{}\n# rare_marker_{}\n", SAMPLE_MODULE, i)
        } else {
            SAMPLE_MODULE.to_string()
        };
        fs::write(dir.join(format!("module_{}.py", i)), body).unwrap();
        if i % 10 == 0 {
            fs::write(dir.join(format!("notes_{}.md", i)), "# notes\n").unwrap();
        }
    }
    for ignored in [".git/objects", "node_modules/lib"] {
        let dir = root.join(ignored);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..num_files / 10 {
            fs::write(dir.join(format!("blob_{}.py", i)), SAMPLE_MODULE).unwrap();
        }
    }
}

// ─── Matcher Benchmarks ──────────────────────────────────────────────

fn bench_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("matcher");
    let lines: Vec<String> = SAMPLE_MODULE.lines().map(str::to_string).collect();

    let plain = QueryMatcher::compile("evaluate", false, false).unwrap();
    let plain_cs = QueryMatcher::compile("evaluate", false, true).unwrap();
    let regex = QueryMatcher::compile(r"def\s+_?evaluate\w*", true, false).unwrap();

    group.bench_function("plain_insensitive", |b| {
        b.iter(|| lines.iter().filter(|l| plain.is_match(black_box(l))).count())
    });
    group.bench_function("plain_sensitive", |b| {
        b.iter(|| lines.iter().filter(|l| plain_cs.is_match(black_box(l))).count())
    });
    group.bench_function("regex", |b| {
        b.iter(|| lines.iter().filter(|l| regex.is_match(black_box(l))).count())
    });
    group.bench_function("context_window_c2", |b| {
        b.iter(|| context_window(black_box(&lines), 12, 2))
    });

    group.finish();
}

// ─── Search Benchmarks ───────────────────────────────────────────────

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10); // Filesystem walks need fewer samples
    let weights = ScoreWeights::default();

    for &num_files in &[200, 2_000] {
        let tmp = tempfile::tempdir().unwrap();
        build_tree(tmp.path(), num_files);
        let sandbox = Sandbox::new(tmp.path()).unwrap();

        let by_name = SearchRequest {
            name_globs: vec!["module_1*.py".to_string()],
            ..SearchRequest::default()
        };
        let plain = SearchRequest {
            extensions: vec![".py".to_string()],
            content_query: Some("rare_marker".to_string()),
            ..SearchRequest::default()
        };
        let regex = SearchRequest {
            extensions: vec![".py".to_string()],
            content_query: Some(r"rare_marker_\d+0\b".to_string()),
            use_regex: true,
            ..SearchRequest::default()
        };

        group.bench_with_input(BenchmarkId::new("name_glob", num_files), &by_name, |b, req| {
            b.iter(|| search(&sandbox, black_box(req), &weights).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("content_plain", num_files), &plain, |b, req| {
            b.iter(|| search(&sandbox, black_box(req), &weights).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("content_regex", num_files), &regex, |b, req| {
            b.iter(|| search(&sandbox, black_box(req), &weights).unwrap())
        });
    }

    group.finish();
}

// ─── Resolver Benchmarks ─────────────────────────────────────────────

fn bench_resolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolver");
    group.sample_size(10);

    let tmp = tempfile::tempdir().unwrap();
    build_tree(tmp.path(), 2_000);
    let sandbox = Sandbox::new(tmp.path()).unwrap();
    let cached = vec!["pkg_7/module_1987.py".to_string()];

    group.bench_function("cached_hit", |b| {
        b.iter(|| resolve_path(&sandbox, black_box("module_1987.py"), &cached))
    });
    group.bench_function("full_scan_unique", |b| {
        b.iter(|| resolve_path(&sandbox, black_box("module_1987.py"), &[]))
    });
    group.bench_function("full_scan_miss", |b| {
        b.iter(|| resolve_path(&sandbox, black_box("missing.py"), &[]))
    });

    group.finish();
}

criterion_group!(benches, bench_matcher, bench_search, bench_resolver);
criterion_main!(benches);
