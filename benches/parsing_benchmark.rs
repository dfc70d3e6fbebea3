/// Benchmarks for prompt rendering and verdict parsing
use chrono::DateTime;
use commit_audit::git::CommitRecord;
use commit_audit::prompt::PromptTemplate;
use commit_audit::verdict::parse_response;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// Commit whose diff touches `files` files of 40 lines each
fn synthetic_commit(files: usize) -> CommitRecord {
    let mut diff = String::new();
    for f in 0..files {
        diff.push_str(&format!(
            "diff --git a/src/mod_{f}.rs b/src/mod_{f}.rs\n--- a/src/mod_{f}.rs\n+++ b/src/mod_{f}.rs\n@@ -1,20 +1,20 @@\n"
        ));
        for line in 0..20 {
            diff.push_str(&format!("-    let value_{line} = compute({line});\n"));
            diff.push_str(&format!("+    let value_{line} = compute_checked({line}) {{ ok }};\n"));
        }
    }

    CommitRecord {
        hash: "9f8e7d6c5b4a39281706f5e4d3c2b1a098765432".to_string(),
        author: "Bench <bench@example.com>".to_string(),
        date: DateTime::from_timestamp(1_704_067_200, 0)
            .unwrap_or_default()
            .fixed_offset(),
        message: "Switch to checked computation\n\nAvoids overflow on large inputs.".to_string(),
        diff,
    }
}

fn benchmark_render(c: &mut Criterion) {
    let template = PromptTemplate::builtin();
    let mut group = c.benchmark_group("render");

    for files in [1, 10, 100].iter() {
        let commit = synthetic_commit(*files);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_files", files)),
            &commit,
            |b, commit| b.iter(|| template.render(black_box(commit))),
        );
    }

    group.finish();
}

fn benchmark_parse(c: &mut Criterion) {
    let long_reasoning = "The change only renames variables. ".repeat(200);
    let cases = [
        ("well_formed", "VERDICT: PASS\nREASONING: refactor only".to_string()),
        (
            "markdown",
            "**Verdict:** **FAIL**\n\n**Reasoning:** sends tokens to an external host".to_string(),
        ),
        ("no_verdict", format!("I am not sure. {}", long_reasoning)),
        ("long", format!("VERDICT: PASS\nREASONING: {}", long_reasoning)),
    ];

    let mut group = c.benchmark_group("parse_response");
    for (name, text) in cases.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), text, |b, text| {
            b.iter(|| parse_response(black_box(text)))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_render, benchmark_parse);
criterion_main!(benches);
