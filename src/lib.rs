pub mod denoise;
pub mod image_pipeline;
pub mod logger;
