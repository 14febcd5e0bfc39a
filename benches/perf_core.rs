use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mozi::context::{extract_code_keywords, extract_file_references};
use mozi::fixability::analyze_fixability;
use mozi::issue::{CodeMatch, CodeReference, CommentSnapshot, IssueContext, IssueSnapshot};

fn synthetic_body(i: usize) -> String {
    format!(
        "Crash when saving record {i}. TypeError: cannot read property 'id' of undefined\n\
         \x20   at saveRecord (src/store/records_{i}.ts:{line}:5)\n\
         \x20   at handler (src/api/routes.ts:88:12)\n\
         Steps to reproduce:\n1. open the form\n2. press save\n\
         Expected behavior: the record should persist. function saveRecord and class RecordStore\n\
         are involved; const retryCount also looks wrong. Error: staleHandle",
        line = 10 + i % 90
    )
}

fn synthetic_comments(count: usize) -> Vec<CommentSnapshot> {
    (0..count)
        .map(|i| {
            CommentSnapshot::new(format!(
                "Seeing this too on lib/sync_{i}.py, def flush_queue fails after upgrade"
            ))
        })
        .collect()
}

fn synthetic_context(i: usize) -> IssueContext {
    let mut ctx = IssueContext {
        issue: IssueSnapshot::new(i as u64, format!("saveRecord() crashes #{i}"), synthetic_body(i))
            .with_labels(["bug", "area: storage"]),
        comments: synthetic_comments(8),
        related_files: Vec::new(),
        code_references: Vec::new(),
    };
    ctx.code_references.push(CodeReference {
        keyword: "saveRecord".to_string(),
        matches: vec![CodeMatch {
            path: "src/store/records.ts".to_string(),
            url: "https://github.com/acme/widgets/blob/main/src/store/records.ts".to_string(),
        }],
    });
    ctx
}

fn bench_extract_references(c: &mut Criterion) {
    let body = synthetic_body(7);
    let comments = synthetic_comments(40);

    c.bench_function("extract_file_references", |b| {
        b.iter(|| black_box(extract_file_references(black_box(&body), black_box(&comments))));
    });

    c.bench_function("extract_code_keywords", |b| {
        b.iter(|| black_box(extract_code_keywords(black_box(&body), black_box(&comments))));
    });
}

fn bench_analyze_batch(c: &mut Criterion) {
    let contexts: Vec<IssueContext> = (0..500).map(synthetic_context).collect();

    c.bench_function("analyze_fixability_500", |b| {
        b.iter(|| {
            for ctx in &contexts {
                black_box(analyze_fixability(black_box(ctx)));
            }
        });
    });
}

criterion_group!(perf_core, bench_extract_references, bench_analyze_batch);
criterion_main!(perf_core);
