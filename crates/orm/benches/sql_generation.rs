//! SQL Generation Benchmarks
//!
//! Rendering cost of the query builder: condition maps, list expansion and
//! raw condition rewriting

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dbwk_orm::{DatabaseValue, ModelSchema, OrderDirection, QueryBuilder};
use std::sync::Arc;

fn schema() -> Arc<ModelSchema> {
    Arc::new(
        ModelSchema::builder("Article", "articles")
            .attribute("id", "id")
            .attribute("title", "Title")
            .attribute("category_id", "CategoryId")
            .attribute("published_at", "PubDate")
            .attribute("status", "Status")
            .build()
            .expect("valid schema"),
    )
}

fn bench_basic_sql_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("basic_sql_generation");
    let schema = schema();

    group.bench_function("simple_select", |b| {
        let query = QueryBuilder::new(schema.clone()).select("id, Title");
        b.iter(|| black_box(query.sql()))
    });

    group.bench_function("select_with_where", |b| {
        let query = QueryBuilder::new(schema.clone())
            .select("*")
            .where_map([
                ("status", DatabaseValue::from("published")),
                ("published_at[>]", DatabaseValue::from(1_700_000_000_i64)),
            ])
            .expect("known attributes")
            .order([("published_at", OrderDirection::Desc)])
            .expect("known attributes")
            .paginate(3, 20);
        b.iter(|| black_box((query.sql(), query.params())))
    });

    group.finish();
}

fn bench_condition_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("condition_building");
    let schema = schema();

    for size in [1usize, 10, 100] {
        let ids: Vec<i64> = (0..size as i64).collect();
        group.bench_with_input(BenchmarkId::new("in_list", size), &ids, |b, ids| {
            b.iter(|| {
                QueryBuilder::new(schema.clone())
                    .select("*")
                    .where_map([("category_id", ids.clone())])
                    .map(|query| query.sql())
            })
        });
    }

    group.bench_function("raw_rewrite", |b| {
        b.iter(|| {
            QueryBuilder::new(schema.clone())
                .select("*")
                .where_raw(
                    black_box("title LIKE :q AND (published_at > :since OR category_id IN :cats)"),
                    [
                        ("q", DatabaseValue::from("%vote%")),
                        ("since", DatabaseValue::from(0)),
                        ("cats", DatabaseValue::from(vec![1, 2, 3])),
                    ],
                )
                .map(|query| query.sql())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_basic_sql_generation, bench_condition_building);
criterion_main!(benches);
