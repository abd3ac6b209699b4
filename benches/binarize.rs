use criterion::{black_box, criterion_group, criterion_main, Criterion};
use polycode::binarize::{binarize_row, binarize_row_adaptive, normalize_modules, runs};
use polycode::qr::synthesize_qr_v1;
use polycode::{DecodeEngine, PixelBuffer, PixelFormat, ReaderOptions};

fn make_row(width: usize, seed: u32) -> Vec<u8> {
    // «полосатый» шум: стабильный и не совсем рандомный
    let mut x = seed;
    (0..width)
        .map(|i| {
            x = x.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let v = ((x >> 24) & 0xFF) as u8;
            if (i / 7) % 2 == 0 {
                v.saturating_add(32)
            } else {
                v.saturating_sub(32)
            }
        })
        .collect()
}

fn bench_binarize(c: &mut Criterion) {
    let width = 2048usize;
    let row = make_row(width, 123);

    c.bench_function("binarize_row", |b| {
        b.iter(|| {
            let bin = binarize_row(black_box(&row));
            black_box(bin.len())
        });
    });

    c.bench_function("binarize_row_adaptive", |b| {
        b.iter(|| {
            let bin = binarize_row_adaptive(black_box(&row));
            black_box(bin.len())
        });
    });

    c.bench_function("runs + normalize_modules", |b| {
        b.iter(|| {
            let bin = binarize_row_adaptive(black_box(&row));
            let rl = runs(&bin);
            let nm = normalize_modules(&rl);
            black_box(nm.len())
        });
    });
}

fn bench_full_decode(c: &mut Criterion) {
    let g = synthesize_qr_v1("BENCHMARK", 3, 4);
    let buf = PixelBuffer::packed(g.data.clone(), g.width, g.height, PixelFormat::Luminance)
        .expect("buffer");
    let engine = DecodeEngine::new();
    let opts = ReaderOptions::new();

    c.bench_function("decode_one qr_v1", |b| {
        b.iter(|| {
            let r = engine.decode_one(black_box(&buf), &opts);
            black_box(r.is_ok())
        });
    });
}

criterion_group!(benches, bench_binarize, bench_full_decode);
criterion_main!(benches);
