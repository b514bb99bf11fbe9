use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rfp_core::chunking::chunk_text;

fn sample_document(paragraphs: usize) -> String {
    let mut text = String::new();
    for i in 0..paragraphs {
        text.push_str(&format!("Section {i}\n\nThis paragraph describes requirement {i} in enough detail to span several sentences. The vendor must support configurable retention policies, role-based access control, and an audit trail for every administrative action.\n\n"));
    }
    text
}

fn bench_chunk_text(c: &mut Criterion) {
    let small = sample_document(20);
    let large = sample_document(400);

    let mut group = c.benchmark_group("chunk_text");
    group.bench_function("small_document", |b| {
        b.iter(|| chunk_text(black_box(&small), 4000, 200));
    });
    group.bench_function("large_document", |b| {
        b.iter(|| chunk_text(black_box(&large), 4000, 200));
    });
    group.finish();
}

criterion_group!(benches, bench_chunk_text);
criterion_main!(benches);
