use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use imgdenoise::denoise::{DeviceType, Quality};
use imgdenoise::image_pipeline::{
    AuxiliaryPaths, ConversionError, DEFAULT_JPEG_QUALITY, DenoiseConfig, DenoisePipeline,
};
use imgdenoise::logger::{self, error, info};

#[derive(Parser)]
#[command(name = "imgdenoise")]
#[command(version, about = "Denoise an 8-bit RGB image and write it as JPEG", long_about = None)]
struct Cli {
    /// Input image (JPEG or PNG, 3 channels)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output JPEG file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Albedo feature image guiding the filter
    #[arg(long, value_name = "FILE")]
    albedo: Option<PathBuf>,

    /// Normal feature image, components mapped from [0,1] to [-1,1]
    #[arg(long, value_name = "FILE", requires = "albedo")]
    normal: Option<PathBuf>,

    /// Device the filter runs on
    #[arg(long, value_name = "TYPE", default_value = "default")]
    device: DeviceArg,

    /// Filter quality
    #[arg(long, value_name = "QUALITY", default_value = "default")]
    quality: QualityArg,

    /// Treat the input as HDR instead of sRGB encoded
    #[arg(long, conflicts_with = "linear")]
    hdr: bool,

    /// Treat the input as linear LDR instead of sRGB encoded
    #[arg(long)]
    linear: bool,

    /// The auxiliary images are noise free
    #[arg(long)]
    clean_aux: bool,

    /// Scale applied to input values before filtering (automatic if omitted)
    #[arg(long, value_name = "FLOAT")]
    input_scale: Option<f32>,

    /// Number of worker threads
    #[arg(short = 'j', long, value_name = "N")]
    threads: Option<usize>,

    /// JPEG quality of the output (1-100)
    #[arg(long, value_name = "N", default_value_t = DEFAULT_JPEG_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Fail when the device reports an error after filtering
    #[arg(long)]
    strict: bool,

    /// Print per-step timings to stderr
    #[arg(long)]
    timings: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum DeviceArg {
    Default,
    Cpu,
    Sycl,
    Cuda,
    Hip,
    Metal,
}

impl From<DeviceArg> for DeviceType {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Default => DeviceType::Default,
            DeviceArg::Cpu => DeviceType::Cpu,
            DeviceArg::Sycl => DeviceType::Sycl,
            DeviceArg::Cuda => DeviceType::Cuda,
            DeviceArg::Hip => DeviceType::Hip,
            DeviceArg::Metal => DeviceType::Metal,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum QualityArg {
    Default,
    Fast,
    Balanced,
    High,
}

impl From<QualityArg> for Quality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Default => Quality::Default,
            QualityArg::Fast => Quality::Fast,
            QualityArg::Balanced => Quality::Balanced,
            QualityArg::High => Quality::High,
        }
    }
}

impl Cli {
    fn config(&self) -> DenoiseConfig {
        DenoiseConfig::builder()
            .device(self.device.into())
            .quality(self.quality.into())
            .num_threads(self.threads)
            .hdr(self.hdr)
            .srgb(!self.hdr && !self.linear)
            .input_scale(self.input_scale)
            .clean_aux(self.clean_aux)
            .jpeg_quality(self.jpeg_quality)
            .fail_on_filter_error(self.strict)
            .build()
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let pipeline = DenoisePipeline::new(cli.config()).context("Failed to open denoising device")?;

    let aux = AuxiliaryPaths {
        albedo: cli.albedo.clone(),
        normal: cli.normal.clone(),
    };

    match pipeline.convert_file_with_aux(&cli.input, &cli.output, &aux) {
        Ok(report) => {
            if let Some(err) = &report.filter_error {
                println!("Error: {}", err.message);
            }
            if cli.timings {
                eprintln!("{}", report.timings);
            }
            info!(output = %cli.output.display(), "Wrote denoised image");
            Ok(ExitCode::SUCCESS)
        }
        Err(ConversionError::UnsupportedChannelCount(found)) => {
            println!("Wrong number of image channels");
            error!(channels = found, "Input must have exactly 3 channels");
            Ok(ExitCode::FAILURE)
        }
        Err(ConversionError::FilterFailed(err)) => {
            println!("Error: {}", err.message);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to denoise {}", cli.input.display())),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init();

    info!("Starting imgdenoise...");

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
