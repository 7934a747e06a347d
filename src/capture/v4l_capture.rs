use super::CaptureSource;
use anyhow::{ensure, Context, Result};
use image::{imageops, RgbImage};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

pub struct WebcamCapture {
    camera: Camera,
    width: u32,
    height: u32,
}

impl WebcamCapture {
    pub fn new(device_index: u32, width: u32, height: u32) -> Result<Self> {
        tracing::info!(
            "Initializing webcam {} at {}x{}",
            device_index,
            width,
            height
        );

        let index = CameraIndex::Index(device_index);
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);

        let mut camera = Camera::new(index, requested).context("Failed to open camera")?;

        camera
            .open_stream()
            .context("Failed to open camera stream")?;

        tracing::info!("Webcam initialized successfully");

        Ok(Self {
            camera,
            width,
            height,
        })
    }
}

impl CaptureSource for WebcamCapture {
    fn capture_frame(&mut self) -> Result<RgbImage> {
        let frame = self.camera.frame().context("Failed to capture frame")?;

        let decoded = frame
            .decode_image::<RgbFormat>()
            .context("Failed to decode frame")?;
        let (width, height) = (decoded.width(), decoded.height());
        ensure!(width > 0 && height > 0, "Camera delivered an empty frame");

        // nokhwa may link a different `image` release than this crate.
        let decoded = RgbImage::from_raw(width, height, decoded.into_raw())
            .context("Camera frame buffer does not match its dimensions")?;

        // Every downstream grid takes the configured capture size.
        if decoded.dimensions() != (self.width, self.height) {
            return Ok(imageops::resize(
                &decoded,
                self.width,
                self.height,
                imageops::FilterType::Triangle,
            ));
        }
        Ok(decoded)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
