//! Benchmarks for the iconpress pipeline.

use std::path::Path;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgba, RgbaImage};

use iconpress::asset::{IconCatalog, SourceAsset};
use iconpress::compose::{self, Axis, LayoutSpec};
use iconpress::order::{self, OrderSpec};
use iconpress::validation::ValidationResult;
use iconpress::workdir::IntermediateGuard;
use iconpress::{naming, ComposedSheet};

fn tile(width: u32, height: u32, shade: u8) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([shade, 64, 128, 255]))
}

fn catalog(count: usize) -> IconCatalog {
    let assets = (0..count)
        .map(|i| {
            let name = format!("items_icon{}_0x{:04X}.png", i, i + 1);
            let source = SourceAsset::from_path(Path::new(&name)).unwrap();
            source.with_raster(tile(44, 44, (i * 3) as u8))
        })
        .collect();
    IconCatalog::from_assets(assets).unwrap()
}

// -- Naming benchmarks --

fn bench_naming(c: &mut Criterion) {
    let mut group = c.benchmark_group("naming");

    group.bench_function("normalize_canonical", |b| {
        b.iter(|| naming::normalize(black_box("items_sword_0x08C0.png")))
    });

    group.bench_function("normalize_messy", |b| {
        b.iter(|| naming::normalize(black_box("items_sword_0X8c0.PNG")))
    });

    group.bench_function("shift", |b| {
        b.iter(|| naming::shift_filename(black_box("items_sword_0x08C0.png"), 0x14C8).unwrap())
    });

    group.finish();
}

// -- Ordering benchmarks --

fn bench_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordering");

    let icons = catalog(64);
    let items = icons.group("items").unwrap();

    let names: Vec<String> = (0..64).rev().map(|i| format!("icon{}", i)).collect();
    let by_names = OrderSpec::Names(names);

    let positions: Vec<usize> = (1..=64).rev().collect();
    let by_position = OrderSpec::Permutation(positions);

    group.bench_function("resolve_names_64", |b| {
        b.iter(|| {
            let mut warnings = ValidationResult::new();
            order::resolve(black_box(items), &by_names, None, &mut warnings).unwrap()
        })
    });

    group.bench_function("resolve_permutation_64", |b| {
        b.iter(|| {
            let mut warnings = ValidationResult::new();
            order::resolve(black_box(items), &by_position, None, &mut warnings).unwrap()
        })
    });

    group.finish();
}

// -- Composition benchmarks --

fn bench_composing(c: &mut Criterion) {
    let mut group = c.benchmark_group("composing");

    let tiles: Vec<RgbaImage> = (0..16).map(|i| tile(44, 44, i * 8)).collect();
    let row: Vec<Option<&RgbaImage>> = tiles.iter().map(Some).collect();

    group.bench_function("stack_row_16", |b| {
        b.iter(|| compose::stack(black_box(&row), 44, 44, Axis::Horizontal, 5))
    });

    let icons = catalog(16);
    let items = icons.group("items").unwrap();
    let slots: Vec<Option<&iconpress::Asset>> = items.sorted_by_id().into_iter().map(Some).collect();
    let layout = LayoutSpec {
        columns: 8,
        rows: None,
        item_width: 44,
        item_height: 44,
        item_padding: 5,
        row_padding: 5,
        group_padding: 10,
    };

    // Sheet composition stages twig/branch intermediates to disk, so this
    // measures the PNG encodes too.
    group.bench_function("compose_sheet_16", |b| {
        let dir = tempfile::tempdir().unwrap();
        let mut guard = IntermediateGuard::new(dir.path(), Duration::from_secs(0));
        b.iter(|| -> ComposedSheet {
            let mut warnings = ValidationResult::new();
            compose::compose_sheet(
                black_box("items"),
                &slots,
                &layout,
                None,
                &mut guard,
                &mut warnings,
            )
            .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_naming, bench_ordering, bench_composing);
criterion_main!(benches);
