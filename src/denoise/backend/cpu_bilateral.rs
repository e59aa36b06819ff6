//! Built-in CPU denoiser.
//!
//! This is a classical joint bilateral filter, not a learned model. Each
//! output pixel is a weighted average of its neighbours where the weights
//! fall off with spatial distance, with the distance between the pixels'
//! tone-mapped colors, and, when auxiliary images are bound, with albedo and
//! normal differences. Because every output is a convex combination of input
//! values the output never leaves the input range.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace};

use crate::denoise::backend::{FilterJob, ImageView, ImageViewMut};
use crate::denoise::error::{DeviceError, Result};
use crate::denoise::filter::FilterParams;
use crate::denoise::types::{ErrorCode, Quality};

type Rgb = [f32; 3];

/// Middle grey that auto-exposure maps the geometric mean luminance to.
const AUTO_EXPOSURE_KEY: f32 = 0.18;

/// Luminance below this is treated as black when computing auto-exposure.
const MIN_LUMINANCE: f32 = 1e-8;

pub(crate) struct CpuBackend {
    pool: Option<ThreadPool>,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Applies the device thread count; `None` or zero uses the global pool.
    pub fn configure(&mut self, num_threads: Option<usize>) -> Result<()> {
        self.pool = match num_threads {
            Some(threads) if threads > 0 => {
                debug!(threads, "Building dedicated denoising thread pool");
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("imgdenoise-cpu-{i}"))
                    .build()
                    .map_err(|e| DeviceError::new(ErrorCode::Unknown, e.to_string()))?;
                Some(pool)
            }
            _ => None,
        };
        Ok(())
    }

    pub fn run_filter(&self, job: &mut FilterJob<'_>) -> Result<()> {
        match &self.pool {
            Some(pool) => pool.install(|| run(job)),
            None => run(job),
        }
    }
}

fn run(job: &mut FilterJob<'_>) -> Result<()> {
    let width = job.output.desc.width;
    let height = job.output.desc.height;
    if width == 0 || height == 0 {
        return Ok(());
    }

    let color = gather(&job.color);
    let albedo = job.albedo.as_ref().map(gather);
    let normal = job.normal.as_ref().map(gather);

    let kernel = Kernel::new(job.params);
    let scale = input_scale(job.params, &color);
    let guide: Vec<Rgb> = color.iter().map(|p| kernel.mode.apply(p, scale)).collect();

    trace!(
        filter = job.kind.name(),
        radius = kernel.radius,
        scale,
        mode = ?kernel.mode,
        "Running built-in bilateral filter"
    );

    let neighborhood = Neighborhood {
        width,
        height,
        color: &color,
        guide: &guide,
        albedo: albedo.as_deref(),
        normal: normal.as_deref(),
    };

    let mut filtered = vec![[0.0f32; 3]; width * height];
    filtered
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                *out = kernel.filter_pixel(&neighborhood, x, y);
            }
        });

    scatter(&filtered, &mut job.output);
    Ok(())
}

/// How color differences are measured for the range kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RangeMode {
    /// Reinhard-compressed HDR values
    Hdr,
    /// Values already sRGB encoded
    Srgb,
    /// Linear LDR values, sRGB encoded before comparison
    Linear,
    /// Signed directional lightmap coefficients
    Directional,
}

impl RangeMode {
    fn for_params(params: &FilterParams) -> Self {
        if params.directional {
            RangeMode::Directional
        } else if params.hdr {
            RangeMode::Hdr
        } else if params.srgb {
            RangeMode::Srgb
        } else {
            RangeMode::Linear
        }
    }

    fn apply(self, pixel: &Rgb, scale: f32) -> Rgb {
        pixel.map(|v| {
            let v = v * scale;
            match self {
                RangeMode::Hdr => {
                    let v = v.max(0.0);
                    v / (1.0 + v)
                }
                RangeMode::Srgb => v.clamp(0.0, 1.0),
                RangeMode::Linear => linear_to_srgb(v.clamp(0.0, 1.0)),
                RangeMode::Directional => v.clamp(-1.0, 1.0),
            }
        })
    }
}

fn linear_to_srgb(x: f32) -> f32 {
    if x <= 0.0031308 {
        12.92 * x
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

fn luminance(p: &Rgb) -> f32 {
    0.2126 * p[0] + 0.7152 * p[1] + 0.0722 * p[2]
}

/// Explicit input scale, or auto-exposure for HDR input.
fn input_scale(params: &FilterParams, color: &[Rgb]) -> f32 {
    if params.input_scale.is_finite() && params.input_scale > 0.0 {
        return params.input_scale;
    }
    if !params.hdr {
        return 1.0;
    }

    let (log_sum, count) = color
        .iter()
        .map(luminance)
        .filter(|&l| l > MIN_LUMINANCE)
        .fold((0.0f64, 0usize), |(sum, n), l| (sum + f64::from(l).ln(), n + 1));
    if count == 0 {
        return 1.0;
    }
    let geometric_mean = (log_sum / count as f64).exp() as f32;
    AUTO_EXPOSURE_KEY / geometric_mean
}

struct Neighborhood<'a> {
    width: usize,
    height: usize,
    color: &'a [Rgb],
    guide: &'a [Rgb],
    albedo: Option<&'a [Rgb]>,
    normal: Option<&'a [Rgb]>,
}

struct Kernel {
    radius: usize,
    spatial: Vec<f32>,
    range_falloff: f32,
    albedo_falloff: f32,
    normal_falloff: f32,
    mode: RangeMode,
}

impl Kernel {
    fn new(params: &FilterParams) -> Self {
        let radius = match params.quality {
            Quality::Fast => 1,
            Quality::Balanced => 2,
            Quality::High | Quality::Default => 3,
        };
        let mode = RangeMode::for_params(params);

        let sigma_spatial = radius as f32;
        let side = 2 * radius + 1;
        let spatial = (0..side * side)
            .map(|i| {
                let dx = (i % side) as f32 - radius as f32;
                let dy = (i / side) as f32 - radius as f32;
                (-(dx * dx + dy * dy) / (2.0 * sigma_spatial * sigma_spatial)).exp()
            })
            .collect();

        let sigma_range = if mode == RangeMode::Directional { 0.2 } else { 0.1 };
        // Clean auxiliary features can be trusted to separate edges sharply.
        let (sigma_albedo, sigma_normal) = if params.clean_aux {
            (0.05, 0.1)
        } else {
            (0.15, 0.3)
        };

        Self {
            radius,
            spatial,
            range_falloff: falloff(sigma_range),
            albedo_falloff: falloff(sigma_albedo),
            normal_falloff: falloff(sigma_normal),
            mode,
        }
    }

    fn filter_pixel(&self, n: &Neighborhood<'_>, x: usize, y: usize) -> Rgb {
        let center = y * n.width + x;
        let side = 2 * self.radius + 1;

        let y0 = y.saturating_sub(self.radius);
        let y1 = (y + self.radius).min(n.height - 1);
        let x0 = x.saturating_sub(self.radius);
        let x1 = (x + self.radius).min(n.width - 1);

        let mut sum = [0.0f32; 3];
        let mut total = 0.0f32;
        for qy in y0..=y1 {
            for qx in x0..=x1 {
                let q = qy * n.width + qx;
                let k = (qy + self.radius - y) * side + (qx + self.radius - x);

                let mut exponent = distance2(&n.guide[center], &n.guide[q]) * self.range_falloff;
                if let Some(albedo) = n.albedo {
                    exponent += distance2(&albedo[center], &albedo[q]) * self.albedo_falloff;
                }
                if let Some(normal) = n.normal {
                    exponent += distance2(&normal[center], &normal[q]) * self.normal_falloff;
                }
                let weight = self.spatial[k] * (-exponent).exp();

                for c in 0..3 {
                    sum[c] += weight * n.color[q][c];
                }
                total += weight;
            }
        }

        // The center pixel always contributes a weight of one.
        sum.map(|s| s / total)
    }
}

fn falloff(sigma: f32) -> f32 {
    1.0 / (2.0 * sigma * sigma)
}

fn distance2(a: &Rgb, b: &Rgb) -> f32 {
    (0..3).map(|c| (a[c] - b[c]) * (a[c] - b[c])).sum()
}

fn gather(view: &ImageView<'_>) -> Vec<Rgb> {
    let desc = view.desc;
    let mut pixels = Vec::with_capacity(desc.width * desc.height);
    for y in 0..desc.height {
        for x in 0..desc.width {
            let i = desc.index_of(x, y);
            pixels.push([view.data[i], view.data[i + 1], view.data[i + 2]]);
        }
    }
    pixels
}

fn scatter(pixels: &[Rgb], view: &mut ImageViewMut<'_>) {
    let desc = view.desc;
    for y in 0..desc.height {
        for x in 0..desc.width {
            let i = desc.index_of(x, y);
            view.data[i..i + 3].copy_from_slice(&pixels[y * desc.width + x]);
        }
    }
}
