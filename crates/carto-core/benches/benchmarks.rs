//! Benchmarks for the per-click work: index build and full-layer restyle.
//!
//! Run with: cargo bench -p carto-core --bench benchmarks

use carto_core::geometry::Geometry;
use carto_core::index::FeatureIndex;
use carto_core::layer::PropertyValue;
use carto_core::style::restyle_all;
use carto_core::{GeometryLayer, MapConfig, RecordingEngine, SelectionCoordinator};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeMap;
use std::hint::black_box;

fn layer(n: usize) -> GeometryLayer {
    GeometryLayer::from_parts((0..n).map(|i| {
        let mut props = BTreeMap::new();
        props.insert("NOM_PROV".to_owned(), PropertyValue::Text(format!("Province {i}")));
        let lon = -13.0 + (i % 20) as f64 * 0.5;
        let lat = 28.0 + (i / 20) as f64 * 0.5;
        let ring = vec![
            [lon, lat],
            [lon + 0.5, lat],
            [lon + 0.5, lat + 0.5],
            [lon, lat + 0.5],
            [lon, lat],
        ];
        (props, Some(Geometry::Polygon(vec![ring])))
    }))
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    for n in [12usize, 75, 500] {
        let l = layer(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &l, |b, l| {
            b.iter(|| FeatureIndex::build(black_box(l)))
        });
    }
    group.finish();
}

fn bench_restyle(c: &mut Criterion) {
    let mut group = c.benchmark_group("restyle_all");
    for n in [12usize, 75, 500] {
        let l = layer(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &l, |b, l| {
            b.iter(|| restyle_all(black_box(l), Some("Province 7")))
        });
    }
    group.finish();
}

fn bench_click(c: &mut Criterion) {
    let mut map = SelectionCoordinator::new(RecordingEngine::new(), MapConfig::default());
    map.load_layer(layer(75));
    c.bench_function("list_click_75", |b| {
        b.iter(|| {
            map.select_from_list(black_box("Province 42"));
            map.engine_mut().take();
        })
    });
}

criterion_group!(benches, bench_index, bench_restyle, bench_click);
criterion_main!(benches);
