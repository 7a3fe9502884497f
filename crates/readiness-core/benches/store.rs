use std::path::PathBuf;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use readiness_core::model::{AssessmentState, Catalog, CatalogLayout};
use readiness_core::parser::parse_catalog;
use readiness_core::results::AssessmentResults;
use readiness_core::store::AnswerStore;

fn reference_catalog() -> Catalog {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../catalog/provision29.toml");
    parse_catalog(&path).expect("reference catalog parses")
}

fn filled_store(catalog: &Catalog) -> AnswerStore {
    let mut store = AnswerStore::in_memory(catalog.layout());
    for section in &catalog.sections {
        for question in &section.questions {
            let option = &question.options[question.id as usize % question.options.len()];
            store.set_section_answer(section.id, question.id, &option.label, option.score);
        }
    }
    store
}

fn bench_upsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("upsert");

    group.bench_function("fill 5x5", |b| {
        b.iter(|| {
            let mut store = AnswerStore::in_memory(CatalogLayout::uniform(5, 5));
            for i in 0..25u32 {
                store.set_section_answer(black_box(i / 5 + 1), i % 5, "option", i % 5);
            }
            store
        })
    });

    group.bench_function("replace existing", |b| {
        let mut store = AnswerStore::in_memory(CatalogLayout::uniform(5, 5));
        for q in 0..5 {
            store.set_section_answer(1, q, "option", 1);
        }
        b.iter(|| store.set_section_answer(black_box(1), black_box(4), "other", 3))
    });

    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let catalog = reference_catalog();
    let store = filled_store(&catalog);

    c.bench_function("overall_progress", |b| b.iter(|| black_box(&store).overall_progress()));
    c.bench_function("results", |b| {
        b.iter(|| AssessmentResults::compute(black_box(&store), &catalog))
    });
}

fn bench_normalize(c: &mut Criterion) {
    let catalog = reference_catalog();
    let state = filled_store(&catalog).state().clone();
    let layout = CatalogLayout::uniform(3, 4);

    c.bench_function("normalize shrinking layout", |b| {
        b.iter(|| {
            let mut s: AssessmentState = state.clone();
            s.normalize(black_box(&layout))
        })
    });
}

criterion_group!(benches, bench_upsert, bench_queries, bench_normalize);
criterion_main!(benches);
