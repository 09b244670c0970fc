//! Frame path benchmark: memory copy, view healing and terminal rasterizing.
//!
//! Target: < 2ms per 320×200 frame end to end

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use framebridge::memory::LinearMemory;
use framebridge::render::{CaptureSurface, FrameRenderer, RgbaFrame, Surface};
use framebridge::terminal::TerminalSurface;
use std::io::sink;

fn test_pixels(width: u32, height: u32) -> Vec<u8> {
    (0..width * height * 4).map(|i| (i % 251) as u8).collect()
}

fn copy_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_frame");

    for (width, height) in [(120, 60), (320, 200), (640, 480)] {
        let pixels = test_pixels(width, height);
        let memory = LinearMemory::with_pages(pixels.len() / framebridge::memory::PAGE_SIZE + 1);
        memory.write(0, &pixels).unwrap();
        let mut renderer = FrameRenderer::new(memory, CaptureSurface::new());

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &pixels.len(),
            |b, &len| b.iter(|| renderer.render_frame(black_box(0), len, width, height)),
        );
    }

    group.finish();
}

fn copy_after_growth(c: &mut Criterion) {
    let pixels = test_pixels(320, 200);
    let memory = LinearMemory::with_pages(5);
    memory.write(0, &pixels).unwrap();
    let mut renderer = FrameRenderer::new(memory.clone(), CaptureSurface::new());

    // Every iteration pays for one view rebuild
    c.bench_function("copy_320x200_stale_view", |b| {
        b.iter(|| {
            memory.replace(pixels.clone());
            renderer.render_frame(0, pixels.len(), 320, 200)
        })
    });
}

fn terminal_present(c: &mut Criterion) {
    let pixels = test_pixels(320, 200);
    let other: Vec<u8> = pixels.iter().map(|p| p.wrapping_add(1)).collect();
    let mut surface = TerminalSurface::new(sink(), 200, 50).unwrap();

    c.bench_function("terminal_present_320x200_on_200x50", |b| {
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let bytes = if flip { &pixels } else { &other };
            let frame = RgbaFrame::new(320, 200, bytes).unwrap();
            surface.present(black_box(frame))
        })
    });
}

criterion_group!(benches, copy_frame, copy_after_growth, terminal_present);
criterion_main!(benches);
