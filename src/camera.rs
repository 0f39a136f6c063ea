// src/camera.rs

use crate::error::CaptureError;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst},
};
use std::time::Instant;
use tracing::{debug, info, warn};

/// One captured frame: the BGR image for display plus its RGB bytes for the
/// pose model, stamped with the monotonic capture time.
pub struct CapturedFrame {
    pub image: Mat,
    pub rgb: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub captured_at: Instant,
}

/// Webcam handle. The device is released when this is dropped.
pub struct Camera {
    cap: VideoCapture,
    device: i32,
    pub frames_read: u64,
}

impl Camera {
    pub fn open(device: i32) -> Result<Self, CaptureError> {
        info!("Opening camera {}", device);

        let cap = VideoCapture::new(device, videoio::CAP_ANY)
            .map_err(|e| unavailable(device, e.to_string()))?;

        if !cap.is_opened().map_err(|e| unavailable(device, e.to_string()))? {
            return Err(unavailable(device, "device could not be opened".to_string()));
        }

        let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH).unwrap_or(0.0);
        let height =
            VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT).unwrap_or(0.0);
        let fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS).unwrap_or(0.0);
        info!(
            "✓ Camera ready: {}x{} @ {:.1} FPS",
            width as i32, height as i32, fps
        );

        Ok(Self {
            cap,
            device,
            frames_read: 0,
        })
    }

    /// Blocks until the device delivers the next frame.
    pub fn read_frame(&mut self) -> Result<CapturedFrame, CaptureError> {
        let mut image = Mat::default();

        let ok = VideoCaptureTrait::read(&mut self.cap, &mut image)
            .map_err(|e| unavailable(self.device, e.to_string()))?;
        let captured_at = Instant::now();

        if !ok || image.empty() {
            return Err(unavailable(self.device, "frame read failed".to_string()));
        }

        let mut rgb_mat = Mat::default();
        imgproc::cvt_color_def(&image, &mut rgb_mat, imgproc::COLOR_BGR2RGB)
            .map_err(|e| unavailable(self.device, e.to_string()))?;

        let rgb = if rgb_mat.is_continuous() {
            rgb_mat
                .data_bytes()
                .map_err(|e| unavailable(self.device, e.to_string()))?
                .to_vec()
        } else {
            rgb_mat
                .try_clone()
                .and_then(|m| m.data_bytes().map(|b| b.to_vec()))
                .map_err(|e| unavailable(self.device, e.to_string()))?
        };

        self.frames_read += 1;

        Ok(CapturedFrame {
            width: image.cols() as usize,
            height: image.rows() as usize,
            image,
            rgb,
            captured_at,
        })
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        match VideoCaptureTrait::release(&mut self.cap) {
            Ok(()) => debug!("Camera {} released after {} frames", self.device, self.frames_read),
            Err(e) => warn!("Failed to release camera {}: {}", self.device, e),
        }
    }
}

fn unavailable(device: i32, reason: String) -> CaptureError {
    CaptureError::Unavailable { device, reason }
}
