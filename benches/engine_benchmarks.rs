use columnar_engine::column::numeric::PrimitiveColumn;
use columnar_engine::column::varchar::VarcharColumn;
use columnar_engine::config::EngineConfig;
use columnar_engine::kernels::compare::{filter_i32, CompareOp};
use columnar_engine::kernels::reduce::sum_i32;
use columnar_engine::sort::{arg_sort, largest, smallest, SortKey};
use columnar_engine::{Column, ColumnDef, ColumnType, JoinKind, Schema, Table};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn int_table(count: usize, cardinality: i32) -> Table {
    let mut col: PrimitiveColumn<i32> = PrimitiveColumn::new("k", false, count);
    for i in 0..count {
        col.append((i as i32) % cardinality);
    }
    let schema = Schema::new(vec![ColumnDef::new("k", ColumnType::I32, false)]).unwrap();
    Table::new(schema, vec![Column::I32(col)]).unwrap()
}

fn int_value_table(count: usize, cardinality: i32) -> Table {
    let mut key: PrimitiveColumn<i32> = PrimitiveColumn::new("k", false, count);
    let mut val: PrimitiveColumn<i32> = PrimitiveColumn::new("v", false, count);
    for i in 0..count {
        key.append((i as i32) % cardinality);
        val.append(i as i32);
    }
    let schema = Schema::new(vec![
        ColumnDef::new("k", ColumnType::I32, false),
        ColumnDef::new("v", ColumnType::I32, false),
    ])
    .unwrap();
    Table::new(schema, vec![Column::I32(key), Column::I32(val)]).unwrap()
}

fn string_table(count: usize, cardinality: usize) -> Table {
    let mut col = VarcharColumn::new("s", false, count);
    for i in 0..count {
        col.append(&format!("key-{}", i % cardinality));
    }
    let schema = Schema::new(vec![ColumnDef::new("s", ColumnType::String, false)]).unwrap();
    Table::new(schema, vec![Column::Varchar(col)]).unwrap()
}

fn bench_grouping_direct_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping_int_direct_map");
    for count in [100, 1_000, 10_000].iter() {
        let table = int_table(*count, 50);
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let grouped = table.group_by(black_box(&["k"])).unwrap();
                black_box(grouped.num_groups());
            });
        });
    }
    group.finish();
}

fn bench_grouping_int_radix(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping_int_radix");
    let config = EngineConfig { int_direct_map_threshold: 10, ..EngineConfig::default() };
    for count in [100, 1_000, 10_000].iter() {
        let table = int_table(*count, 50_000);
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let grouped = table.group_by_with_config(black_box(&["k"]), &config).unwrap();
                black_box(grouped.num_groups());
            });
        });
    }
    group.finish();
}

fn bench_grouping_generic_hash_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping_generic_hash_map_strings");
    for count in [100, 1_000, 10_000].iter() {
        let table = string_table(*count, 50);
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let grouped = table.group_by(black_box(&["s"])).unwrap();
                black_box(grouped.num_groups());
            });
        });
    }
    group.finish();
}

fn bench_aggregation_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation_sum");
    for count in [100, 1_000, 10_000].iter() {
        let table = int_value_table(*count, 50);
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let grouped = table.group_by(black_box(&["k"])).unwrap();
                black_box(grouped.sum("v").unwrap());
            });
        });
    }
    group.finish();
}

fn bench_vectorized_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("vectorized_sum_i32");
    for count in [100, 1_000, 10_000].iter() {
        let table = int_value_table(*count, *count as i32);
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| match table.column("v").unwrap() {
                Column::I32(c) => black_box(sum_i32(c)),
                _ => unreachable!(),
            });
        });
    }
    group.finish();
}

fn bench_join_inner(c: &mut Criterion) {
    let mut group = c.benchmark_group("join_inner");
    for count in [100, 1_000, 10_000].iter() {
        let left = int_table(*count, *count as i32 / 4 + 1);
        let right = int_table(*count, *count as i32 / 4 + 1);
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let joined = left.join(black_box(&right), "k", JoinKind::Inner).unwrap();
                black_box(joined.row_count());
            });
        });
    }
    group.finish();
}

fn bench_join_left(c: &mut Criterion) {
    let mut group = c.benchmark_group("join_left");
    for count in [100, 1_000, 10_000].iter() {
        let left = int_table(*count, *count as i32 / 4 + 1);
        let right = int_table(*count / 2, *count as i32 / 4 + 1);
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let joined = left.join(black_box(&right), "k", JoinKind::Left).unwrap();
                black_box(joined.row_count());
            });
        });
    }
    group.finish();
}

fn bench_sort_arg_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_arg_sort");
    for count in [100, 1_000, 10_000].iter() {
        let table = int_table(*count, *count as i32);
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let order = arg_sort(black_box(&table), &[SortKey::asc("k")]).unwrap();
                black_box(order.len());
            });
        });
    }
    group.finish();
}

fn bench_top_n(c: &mut Criterion) {
    let mut group = c.benchmark_group("top_n_smallest_largest");
    for count in [100, 1_000, 10_000].iter() {
        let table = int_table(*count, *count as i32);
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                black_box(smallest(&table, 10, "k").unwrap());
                black_box(largest(&table, 10, "k").unwrap());
            });
        });
    }
    group.finish();
}

fn bench_vectorized_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("vectorized_filter_i32");
    for count in [100, 1_000, 10_000].iter() {
        let table = int_table(*count, *count as i32);
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| match table.column("k").unwrap() {
                Column::I32(c) => black_box(filter_i32(c, CompareOp::Lt, *count as i32 / 2)),
                _ => unreachable!(),
            });
        });
    }
    group.finish();
}

criterion_group!(grouping, bench_grouping_direct_map, bench_grouping_int_radix, bench_grouping_generic_hash_map);
criterion_group!(aggregation, bench_aggregation_sum, bench_vectorized_sum);
criterion_group!(joins, bench_join_inner, bench_join_left);
criterion_group!(ordering, bench_sort_arg_sort, bench_top_n);
criterion_group!(filtering, bench_vectorized_filter);
criterion_main!(grouping, aggregation, joins, ordering, filtering);
