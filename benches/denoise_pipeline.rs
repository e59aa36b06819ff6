use std::hint::black_box;
use std::io::Cursor;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use image::{ImageFormat, Rgb, RgbImage};
use imgdenoise::denoise::{Device, Quality, RayTracing};
use imgdenoise::image_pipeline::{DenoiseConfig, DenoisePipeline, DeviceDenoiser, JpegImageWriter, StandardImageReader};

fn generate_noisy_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        let noise = ((x * 7919 + y * 104729) % 61) as u8;
        Rgb([90 + noise, 70 + noise / 2, 50 + noise / 3])
    });
    let mut data = Cursor::new(Vec::new());
    image
        .write_to(&mut data, ImageFormat::Png)
        .expect("PNG encoding of the bench input failed");
    data.into_inner()
}

fn builtin_pipeline(config: DenoiseConfig) -> DenoisePipeline<StandardImageReader, DeviceDenoiser, JpegImageWriter> {
    let denoiser = DeviceDenoiser::with_device(Device::builtin_cpu(), &config).unwrap();
    DenoisePipeline::with_custom(StandardImageReader, denoiser, JpegImageWriter, config)
}

fn benchmark_conversion_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("conversion_by_size");

    let sizes = vec![
        (64, 64, "64x64"),
        (256, 256, "256x256"),
        (512, 512, "512x512"),
    ];

    for (width, height, label) in sizes {
        let input = generate_noisy_png(width, height);

        group.bench_with_input(BenchmarkId::from_parameter(label), &input, |b, data| {
            let pipeline = builtin_pipeline(DenoiseConfig::default());

            b.iter(|| {
                let mut output = Cursor::new(Vec::new());
                let _ = pipeline.convert(black_box(data), &mut output);
            });
        });
    }

    group.finish();
}

fn benchmark_filter_quality(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_quality");
    let (width, height) = (256, 256);
    let color: Vec<f32> = (0..width * height * 3)
        .map(|i| ((i * 2654435761usize) % 1000) as f32 / 1000.0)
        .collect();

    let qualities = vec![
        (Quality::Fast, "fast"),
        (Quality::Balanced, "balanced"),
        (Quality::High, "high"),
    ];

    for (quality, label) in qualities {
        group.bench_with_input(BenchmarkId::from_parameter(label), &color, |b, color| {
            let mut device = Device::builtin_cpu();
            device.commit().unwrap();
            let mut filter = RayTracing::new(&device);
            filter
                .srgb(true)
                .filter_quality(quality)
                .image_dimensions(width, height);
            let mut output = vec![0.0f32; color.len()];

            b.iter(|| {
                let _ = filter.filter(black_box(color), &mut output);
            });
        });
    }

    group.finish();
}

fn benchmark_thread_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("thread_count");
    let input = generate_noisy_png(256, 256);

    for threads in [1usize, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &input, |b, data| {
            let config = DenoiseConfig::builder().num_threads(Some(threads)).build();
            let pipeline = builtin_pipeline(config);

            b.iter(|| {
                let mut output = Cursor::new(Vec::new());
                let _ = pipeline.convert(black_box(data), &mut output);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_conversion_sizes,
    benchmark_filter_quality,
    benchmark_thread_count
);
criterion_main!(benches);
