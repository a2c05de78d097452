//! Benchmarks for the chapter conversion pipeline.
//!
//! Run with: cargo bench

use std::fs;
use std::path::{Path, PathBuf};

use criterion::{Criterion, criterion_group, criterion_main};
use tempfile::TempDir;

use vsi::convert::{ImageReference, strip_markup, substitute_images};
use vsi::{Book, ConvertOptions, NavStrip, transform_chapter};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A chapter roughly the size of a real scraped one: a navigation list, a few
/// dozen paragraphs with page markers and a handful of figures.
fn sample_chapter(dir: &Path) -> PathBuf {
    let assets = dir.join("ch1_files");
    fs::create_dir_all(&assets).unwrap();
    fs::write(assets.join("style.css"), "p { text-indent: 1em; }\n".repeat(50)).unwrap();

    let mut body = String::from(
        r#"<ul class="div1-nav"><li><a href="prev.html">Previous</a></li><li><a href="next.html">Next</a></li></ul>"#,
    );
    for i in 0..60 {
        body.push_str(&format!(
            "<p>Paragraph {i} about how memory consolidates during sleep. \
             <span id=\"page{i}\" class=\"printPage\">p. {i}</span>More text follows here.\
             <span title=\"mark{i}\" class=\"printPageMark\">↵</span></p>"
        ));
        if i % 10 == 0 {
            let name = format!("fig{i}.png");
            fs::write(assets.join(&name), PNG).unwrap();
            body.push_str(&format!(r#"<img src="ch1_files/{name}" alt="Figure {i}"/>"#));
        }
    }

    let html = format!(
        r#"<html><head><meta charset="utf-8"></head><body>
<div class="chapTitle">p. 1. What is memory?</div>
<div class="chunkBody">{body}</div></body></html>"#
    );
    let path = dir.join("ch1.html");
    fs::write(&path, html).unwrap();
    path
}

fn bench_transform_chapter(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let chapter = sample_chapter(temp_dir.path());
    let options = ConvertOptions::default();

    c.bench_function("transform_chapter", |b| {
        b.iter(|| {
            let mut book = Book::new("Memory: A Very Short Introduction");
            transform_chapter(&mut book, &chapter, &options).unwrap()
        });
    });
}

fn bench_cleanup(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let chapter = sample_chapter(temp_dir.path());

    let html = fs::read_to_string(&chapter).unwrap();
    let images: Vec<ImageReference> = (0..60)
        .step_by(10)
        .map(|i| ImageReference {
            original: format!("ch1_files/fig{i}.png"),
            asset: format!("../images/fig{i}.png"),
        })
        .collect();

    c.bench_function("substitute_images", |b| {
        b.iter(|| substitute_images(&html, &images).unwrap());
    });
    c.bench_function("strip_markup_greedy", |b| {
        b.iter(|| strip_markup(&html, NavStrip::Greedy));
    });
    c.bench_function("strip_markup_lazy", |b| {
        b.iter(|| strip_markup(&html, NavStrip::Lazy));
    });
}

criterion_group!(benches, bench_transform_chapter, bench_cleanup);
criterion_main!(benches);
