use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fmt::Write;
use tempfile::TempDir;
use xlsxstream::{read_table, CsvOptions, XlsxStreamReader};

#[path = "../tests/common/mod.rs"]
mod common;

// Every third line left out so the gap filling is exercised
fn generate(dir: &TempDir, size: u32) -> std::path::PathBuf {
    let mut rows = String::new();
    for line in (1..=size).filter(|l| l % 3 != 0) {
        write!(
            rows,
            r#"<row r="{line}"><c r="A{line}"><v>{line}</v></c><c r="B{line}" t="s"><v>{}</v></c><c r="C{line}"><v>{}.25</v></c><c r="D{line}" t="b"><v>{}</v></c></row>"#,
            line % 2,
            line * 100,
            line % 2
        )
        .unwrap();
    }

    let path = dir.path().join(format!("bench_{}.xlsx", size));
    common::WorkbookFixture::new()
        .shared_strings(&["even", "odd"])
        .sheet("Sheet1", 1, common::worksheet(&format!("A1:D{}", size), &rows))
        .write(&path);
    path
}

fn benchmark_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("rows");
    group.sample_size(10); // Reduce samples for large benchmarks

    for size in [1000u32, 10000, 50000].iter() {
        // Prepare test file once
        let dir = TempDir::new().unwrap();
        let path = generate(&dir, *size);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let reader = XlsxStreamReader::open(&path, "Sheet1").unwrap();
                for row_result in reader.rows().unwrap() {
                    black_box(row_result.unwrap());
                }
            });
        });
    }

    group.finish();
}

fn benchmark_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv");
    group.sample_size(10);

    for size in [1000u32, 10000].iter() {
        let dir = TempDir::new().unwrap();
        let path = generate(&dir, *size);
        let out = dir.path().join("out.csv");

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                xlsxstream::write_csv(&path, 1u32, &out, &CsvOptions::default()).unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_table(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = generate(&dir, 10000);

    c.bench_function("table_10000_rows", |b| {
        b.iter(|| black_box(read_table(&path, "Sheet1").unwrap()));
    });
}

criterion_group!(benches, benchmark_rows, benchmark_csv, benchmark_table);
criterion_main!(benches);
