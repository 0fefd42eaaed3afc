//! Resolution and quantity extraction benchmarks.
//!
//! Runs against the in-memory driver at different cart sizes:
//! - Row counts: 10, 100, 500
//!
//! Run with: cargo bench --bench resolution
//! Results saved to: target/criterion/

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use tokio::runtime::Runtime;

use resilient_ui::driver::{Dom, Node};
use resilient_ui::quantity::{self, QuantityProbe};
use resilient_ui::storefront::targets;
use resilient_ui::wait::Probe;
use resilient_ui::{MemoryDriver, Resolver, Scope};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const ROW_COUNTS: &[usize] = &[10, 100, 500];

// ============================================================================
// Fixtures
// ============================================================================

/// A cart with `rows` items titled "Product N", quantity N.
fn cart(rows: usize) -> MemoryDriver {
    let mut dom = Dom::new();
    let root = dom.root();
    let panel = dom.append(root, Node::new("div").with_class("float-cart"));
    for n in 0..rows {
        let item = dom.append(panel, Node::new("div").with_class("shelf-item"));
        let details = dom.append(item, Node::new("div").with_class("shelf-item__details"));
        dom.append(details, Node::new("p").with_text(format!("Product {n}")));
        dom.append(details, Node::new("p").with_text(format!("Quantity: {}", n % 9 + 1)));
        dom.append(item, Node::new("button").with_text("-"));
        dom.append(item, Node::new("button").with_text("+"));
    }
    MemoryDriver::from_dom(dom)
}

// ============================================================================
// Benchmark: Strategy List Resolution
// ============================================================================

fn bench_resolve_item(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("resolve_item");
    for &rows in ROW_COUNTS {
        let driver = cart(rows);
        let target = targets::cart_item(&format!("Product {}", rows - 1));
        group.bench_with_input(BenchmarkId::new("last_row", rows), &rows, |b, _| {
            b.to_async(&rt).iter(|| async {
                let handle = Resolver::new(&driver)
                    .resolve_first(&target, Scope::Document)
                    .await;
                black_box(handle)
            });
        });
    }
    group.finish();
}

// ============================================================================
// Benchmark: Quantity Extraction
// ============================================================================

fn bench_quantity_reader(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("quantity_reader");
    for &rows in ROW_COUNTS {
        let driver = cart(rows);
        let reader = QuantityProbe::new(targets::cart_item(&format!("Product {}", rows / 2)));
        group.bench_with_input(BenchmarkId::new("middle_row", rows), &rows, |b, _| {
            b.to_async(&rt)
                .iter(|| async { black_box(reader.read(&driver).await.ok().flatten()) });
        });
    }
    group.finish();
}

fn bench_parsers(c: &mut Criterion) {
    let text = "Apple iPhone 12\nBlack | Apple\nQuantity: 3\n$799.00";
    c.bench_function("parse_labeled", |b| {
        b.iter(|| quantity::parse_labeled(black_box(text)))
    });
    c.bench_function("parse_loose", |b| {
        b.iter(|| quantity::parse_loose(black_box(text)))
    });
}

criterion_group!(benches, bench_resolve_item, bench_quantity_reader, bench_parsers);
criterion_main!(benches);
