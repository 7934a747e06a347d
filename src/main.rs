use anyhow::{Context, Result};
use clap::Parser;
use halo::capture::{CaptureSource, SyntheticCapture, WebcamCapture};
use halo::outline::{ArrowStyle, BorderPolicy};
use halo::output::PipeOutput;
use halo::runner::{run_pipeline, RunnerOptions};
use halo::segmentation::{self, LumaThreshold, SegmentationModel, PERSON_CLASS};
use halo::{ColorOrder, ColorTriple, EncodingMode, OutlineConfig, OutlinePipeline};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Use the built-in test pattern instead of a webcam
    #[arg(long)]
    synthetic: bool,

    /// Capture resolution width
    #[arg(long, default_value_t = 640)]
    capture_width: u32,

    /// Capture resolution height
    #[arg(long, default_value_t = 480)]
    capture_height: u32,

    /// Target frames per second (0 = unthrottled)
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Path to a DeepLabV3 segmentation model (ONNX file)
    /// If not provided, dark pixels are treated as foreground
    #[arg(long)]
    model: Option<String>,

    /// Model input width
    #[arg(long, default_value_t = 520)]
    model_width: u32,

    /// Model input height
    #[arg(long, default_value_t = 520)]
    model_height: u32,

    /// Pascal VOC class to outline (15 = person)
    #[arg(long, default_value_t = PERSON_CLASS)]
    subject_class: usize,

    /// Output wire format: dense (PNG frames) or sparse (point lists)
    #[arg(long, default_value = "dense")]
    encoding: EncodingMode,

    /// Side of the square erosion kernel (odd)
    #[arg(long, default_value_t = 3)]
    kernel_size: usize,

    /// Number of contour bands
    #[arg(long, default_value_t = 15)]
    layer_count: u32,

    /// Outline color as three comma-separated channels
    #[arg(long, default_value = "0,0,255")]
    outline_color: ColorTriple,

    /// Color of inner rings (defaults to the outline color)
    #[arg(long)]
    sub_outline_color: Option<ColorTriple>,

    /// Channel order of color arguments: bgr or rgb
    #[arg(long, default_value = "bgr")]
    color_order: ColorOrder,

    /// Keep contours and gradients outside the foreground mask
    #[arg(long)]
    include_outside: bool,

    /// How erosion treats pixels beyond the image edge: foreground or background
    #[arg(long, default_value = "foreground")]
    border_policy: BorderPolicy,

    /// Write level-set, overlay, cutout and arrow images to this directory
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Dump debug images every n-th frame
    #[arg(long, default_value_t = 30)]
    debug_every: u64,

    /// Gradient arrow grid spacing in pixels
    #[arg(long, default_value_t = 12)]
    arrow_step: usize,

    /// Gradient arrow length multiplier
    #[arg(long, default_value_t = 0.05)]
    arrow_scale: f32,

    /// Gradient arrow color
    #[arg(long, default_value = "0,0,255")]
    arrow_color: ColorTriple,

    /// Gradient arrow stroke width
    #[arg(long, default_value_t = 1)]
    arrow_thickness: u32,

    /// Gradient arrow tip length relative to the arrow
    #[arg(long, default_value_t = 0.2)]
    arrow_tip: f32,

    /// Worker threads for the distance and gradient passes
    #[arg(long)]
    threads: Option<usize>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn outline_config(&self) -> OutlineConfig {
        let order = self.color_order;
        OutlineConfig {
            kernel_size: self.kernel_size,
            layer_count: self.layer_count,
            outline_color: self.outline_color.to_rgb(order),
            sub_outline_color: self.sub_outline_color.map(|c| c.to_rgb(order)),
            include_outside: self.include_outside,
            border_policy: self.border_policy,
            encoding: self.encoding,
            compute_gradient: self.debug_dir.is_some(),
            arrows: ArrowStyle {
                step: self.arrow_step,
                scale: self.arrow_scale,
                color: self.arrow_color.to_rgb(order),
                thickness: self.arrow_thickness,
                tip_length: self.arrow_tip,
            },
        }
    }

    fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            target_fps: self.fps,
            max_frames: self.max_frames,
            debug_dir: self.debug_dir.clone(),
            debug_every: self.debug_every,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout carries the frame stream
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Halo starting");
    tracing::info!("Capture: {}x{}", args.capture_width, args.capture_height);
    tracing::info!("Encoding: {}", args.encoding);

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
        tracing::info!("Using {} worker threads", threads);
    }

    let pipeline =
        OutlinePipeline::new(args.outline_config()).context("Invalid outline configuration")?;

    let mut model: Box<dyn SegmentationModel> = if let Some(model_path) = &args.model {
        tracing::info!("Loading segmentation model from {}", model_path);
        let model = segmentation::create_default_model(
            model_path,
            (args.model_width, args.model_height),
            args.subject_class,
        )
        .context("Failed to load segmentation model")?;
        tracing::info!("Segmentation model loaded successfully");
        model
    } else {
        tracing::info!("No model given, segmenting by luma threshold");
        Box::new(LumaThreshold::default())
    };

    let mut output = PipeOutput::stdout();
    let options = args.runner_options();

    let summary = if args.synthetic {
        let mut capture =
            SyntheticCapture::with_square(args.capture_width, args.capture_height, 64, 64, 128)
                .drifting(true);
        run(&mut capture, model.as_mut(), &mut output, &pipeline, &options)?
    } else {
        let mut capture =
            WebcamCapture::new(args.input_device, args.capture_width, args.capture_height)
                .context("Failed to initialize webcam capture")?;
        run(&mut capture, model.as_mut(), &mut output, &pipeline, &options)?
    };

    tracing::info!("Wrote {} frames", summary.frames_written);
    Ok(())
}

fn run<C: CaptureSource>(
    capture: &mut C,
    model: &mut dyn SegmentationModel,
    output: &mut PipeOutput<std::io::Stdout>,
    pipeline: &OutlinePipeline,
    options: &RunnerOptions,
) -> Result<halo::runner::RunSummary> {
    let (width, height) = capture.resolution();
    tracing::info!("Capturing at {}x{}", width, height);
    run_pipeline(capture, model, output, pipeline, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_class_defaults_to_person() {
        let args = Args::try_parse_from(["halo"]).unwrap();
        assert_eq!(args.subject_class, PERSON_CLASS);

        let args = Args::try_parse_from(["halo", "--subject-class", "8"]).unwrap();
        assert_eq!(args.subject_class, 8);
    }
}
