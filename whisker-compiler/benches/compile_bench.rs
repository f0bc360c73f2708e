use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use whisker_compiler::{compile, CompileOptions};

fn build_listing_template(rows: usize) -> String {
    let mut src = String::from("<div class=\"listing\"><h1>{{title}}</h1><ul>");
    for i in 0..rows {
        src.push_str(&format!(
            "<li class=\"row-{i}\">{{{{#if visible}}}}<b>{{{{name}}}}</b>{{{{else}}}}hidden{{{{/if}}}}</li>"
        ));
    }
    src.push_str("</ul></div>");
    src
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_listing");
    group.sample_size(30);
    let options = CompileOptions::template();
    for &rows in &[10usize, 100usize, 500usize] {
        let src = build_listing_template(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &src, |b, src| {
            b.iter(|| compile(src, &options).expect("compile"));
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().without_plots();
    targets = bench_compile
}
criterion_main!(benches);
