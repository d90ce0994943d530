//! Benchmarks for flattening and selection-aware removal.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use destyle::{Document, RemoveFormatting, flatten};

/// A styled article: headings, paragraphs, a list, a table and links.
fn sample_html() -> String {
    let mut html = String::new();
    for i in 0..50 {
        html.push_str(&format!(
            r#"<h2 style="color:red">Section {i}</h2>
<p><font face="Arial"><b>Bold</b> and <i>italic <u>underlined</u></i> text with
<a href="/ref/{i}"><span class="x">a link</span></a>.</font></p>
<ul><li><b>one</b></li><li>two</li><li><i>three</i></li></ul>
<table><tr><td><b>a</b></td><td><i>b</i></td></tr>
<tr><td>c</td><td><img src="{i}.png" border="1"></td></tr></table>
"#
        ));
    }
    html
}

// ============================================================================
// Flattening
// ============================================================================

fn bench_flatten(c: &mut Criterion) {
    let html = sample_html();
    c.bench_function("flatten", |b| {
        b.iter(|| flatten(black_box(&html)));
    });
}

// ============================================================================
// Selection-aware removal
// ============================================================================

fn bench_remove_whole_document(c: &mut Criterion) {
    let html = sample_html();
    let remover = RemoveFormatting::new();
    c.bench_function("remove_whole_document", |b| {
        b.iter(|| {
            let mut doc = Document::parse(black_box(&html));
            let len = doc.text().chars().count();
            if doc.select_text(0, len).is_ok() {
                let _ = remover.apply(&mut doc);
            }
            doc
        });
    });
}

fn bench_remove_middle(c: &mut Criterion) {
    let html = sample_html();
    let remover = RemoveFormatting::new();
    c.bench_function("remove_middle", |b| {
        b.iter(|| {
            let mut doc = Document::parse(black_box(&html));
            let len = doc.text().chars().count();
            if doc.select_text(len / 3, 2 * len / 3).is_ok() {
                let _ = remover.apply(&mut doc);
            }
            doc
        });
    });
}

criterion_group!(
    benches,
    bench_flatten,
    bench_remove_whole_document,
    bench_remove_middle,
);
criterion_main!(benches);
