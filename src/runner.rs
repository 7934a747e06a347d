use crate::capture::CaptureSource;
use crate::outline::cutout;
use crate::output::OutputSink;
use crate::pipeline::{FrameResult, OutlinePipeline};
use crate::segmentation::SegmentationModel;
use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Orchestration settings that do not affect the per-frame output.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Frame rate cap; 0 runs unthrottled.
    pub target_fps: u32,
    /// Stop after this many captured frames.
    pub max_frames: Option<u64>,
    /// Directory for periodic visualization dumps.
    pub debug_dir: Option<PathBuf>,
    /// Dump every n-th frame to `debug_dir`.
    pub debug_every: u64,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            target_fps: 30,
            max_frames: None,
            debug_dir: None,
            debug_every: 30,
        }
    }
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_captured: u64,
    pub frames_written: u64,
    /// Frames dropped because segmentation produced an unusable mask.
    pub frames_skipped: u64,
}

#[derive(Default)]
struct StageTimes {
    capture: Duration,
    segment: Duration,
    outline: Duration,
    output: Duration,
}

pub fn run_pipeline<C, O>(
    capture: &mut C,
    model: &mut dyn SegmentationModel,
    output: &mut O,
    pipeline: &OutlinePipeline,
    options: &RunnerOptions,
) -> Result<RunSummary>
where
    C: CaptureSource,
    O: OutputSink,
{
    let frame_duration = (options.target_fps > 0)
        .then(|| Duration::from_secs_f32(1.0 / options.target_fps as f32));
    let mut summary = RunSummary::default();
    let mut times = StageTimes::default();

    if let Some(dir) = &options.debug_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create debug directory {}", dir.display()))?;
    }

    tracing::info!(
        "Starting outline loop: encoding={}, layers={}, kernel={}",
        pipeline.config().encoding,
        pipeline.config().layer_count,
        pipeline.config().kernel_size
    );

    loop {
        if options.max_frames.is_some_and(|max| summary.frames_captured >= max) {
            tracing::info!("Reached frame limit");
            break;
        }
        let loop_start = Instant::now();

        let stage = Instant::now();
        let frame = capture
            .capture_frame()
            .context("Failed to capture frame")?;
        times.capture += stage.elapsed();
        summary.frames_captured += 1;

        let stage = Instant::now();
        let mask = model.segment(&frame).context("Failed to segment frame")?;
        times.segment += stage.elapsed();

        if let Err(e) = mask.check_frame(frame.dimensions()) {
            tracing::warn!("Skipping frame {}: {}", summary.frames_captured, e);
            summary.frames_skipped += 1;
            throttle(frame_duration, loop_start);
            continue;
        }

        let stage = Instant::now();
        let result = pipeline.process(&mask).context("Failed to outline frame")?;
        let encoded = pipeline.encode(&result).context("Failed to encode frame")?;
        times.outline += stage.elapsed();

        if let Some(dir) = &options.debug_dir {
            if summary.frames_captured % options.debug_every.max(1) == 0 {
                dump_debug_images(dir, summary.frames_captured, pipeline, &result, &frame)?;
            }
        }

        let stage = Instant::now();
        match output.write_frame(&encoded) {
            Ok(()) => {}
            Err(e) if e.is_broken_pipe() => {
                tracing::info!("Consumer closed the stream, stopping");
                break;
            }
            Err(e) => return Err(e).context("Failed to write frame"),
        }
        times.output += stage.elapsed();
        summary.frames_written += 1;

        if summary.frames_written % 30 == 0 {
            log_stats(&summary, &times);
        }

        throttle(frame_duration, loop_start);
    }

    tracing::info!(
        "Stopped after {} frames ({} written, {} skipped)",
        summary.frames_captured,
        summary.frames_written,
        summary.frames_skipped
    );
    Ok(summary)
}

/// Sleeps out the rest of the frame budget, if any.
fn throttle(frame_duration: Option<Duration>, loop_start: Instant) {
    if let Some(frame_duration) = frame_duration {
        let elapsed = loop_start.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }
}

/// Per-frame stage averages. Skipped frames still pay for capture and
/// segmentation, so those stages average over every captured frame.
fn stage_averages_ms(summary: &RunSummary, times: &StageTimes) -> [f64; 4] {
    let avg_ms = |d: Duration, frames: u64| d.as_secs_f64() * 1000.0 / frames.max(1) as f64;
    [
        avg_ms(times.capture, summary.frames_captured),
        avg_ms(times.segment, summary.frames_captured),
        avg_ms(times.outline, summary.frames_written),
        avg_ms(times.output, summary.frames_written),
    ]
}

fn log_stats(summary: &RunSummary, times: &StageTimes) {
    let [capture_ms, segment_ms, outline_ms, output_ms] = stage_averages_ms(summary, times);
    let total_ms = capture_ms + segment_ms + outline_ms + output_ms;

    tracing::info!(
        "Frame {}: capture={:.1}ms, segment={:.1}ms, outline={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}",
        summary.frames_written,
        capture_ms,
        segment_ms,
        outline_ms,
        output_ms,
        total_ms,
        1000.0 / total_ms
    );
}

fn dump_debug_images(
    dir: &Path,
    index: u64,
    pipeline: &OutlinePipeline,
    result: &FrameResult,
    frame: &RgbImage,
) -> Result<()> {
    let _span = tracing::debug_span!("debug_dump", index).entered();

    let save = |name: &str, image: &RgbImage| -> Result<()> {
        let path = dir.join(format!("{name}_{index:06}.png"));
        image
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))
    };

    save("levelsets", &pipeline.level_set_image(result)?)?;
    save("overlay", &pipeline.overlay(result)?)?;
    save("cutout", &cutout(frame, &result.mask)?)?;
    if let Some(arrows) = pipeline.arrow_image(result) {
        save("arrows", &arrows)?;
    }

    tracing::debug!("Wrote debug images for frame {} to {}", index, dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SyntheticCapture;
    use crate::config::OutlineConfig;
    use crate::outline::RegionMask;
    use crate::output::PipeOutput;

    struct EmptyMasks;

    impl SegmentationModel for EmptyMasks {
        fn segment(&mut self, _frame: &RgbImage) -> Result<RegionMask> {
            Ok(RegionMask::zeros(0, 0))
        }
    }

    #[test]
    fn skipped_frames_respect_the_frame_rate() {
        let pipeline = OutlinePipeline::new(OutlineConfig::default()).unwrap();
        let mut output = PipeOutput::new(Vec::new());
        let options = RunnerOptions {
            target_fps: 50,
            max_frames: Some(5),
            ..Default::default()
        };

        let start = Instant::now();
        let summary = run_pipeline(
            &mut SyntheticCapture::with_square(16, 16, 4, 4, 6),
            &mut EmptyMasks,
            &mut output,
            &pipeline,
            &options,
        )
        .unwrap();

        assert_eq!(summary.frames_skipped, 5);
        assert!(start.elapsed() >= Duration::from_millis(5 * 20));
    }

    #[test]
    fn capture_and_segment_average_over_captured_frames() {
        let summary = RunSummary {
            frames_captured: 4,
            frames_written: 2,
            frames_skipped: 2,
        };
        let times = StageTimes {
            capture: Duration::from_millis(40),
            segment: Duration::from_millis(80),
            outline: Duration::from_millis(10),
            output: Duration::from_millis(4),
        };

        let [capture, segment, outline, output] = stage_averages_ms(&summary, &times);
        assert!((capture - 10.0).abs() < 1e-9);
        assert!((segment - 20.0).abs() < 1e-9);
        assert!((outline - 5.0).abs() < 1e-9);
        assert!((output - 2.0).abs() < 1e-9);
    }
}
