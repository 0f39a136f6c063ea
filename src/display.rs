// src/display.rs

use anyhow::{Context, Result};
use opencv::{core::Mat, highgui};
use tracing::{debug, warn};

const QUIT_KEY: i32 = b'q' as i32;

/// On-screen window. Destroyed when dropped.
pub struct Display {
    title: String,
}

impl Display {
    pub fn open(title: &str) -> Result<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)
            .with_context(|| format!("Failed to create window '{}'", title))?;
        debug!("Window '{}' opened", title);
        Ok(Self {
            title: title.to_string(),
        })
    }

    pub fn show(&self, frame: &Mat) -> Result<()> {
        highgui::imshow(&self.title, frame)?;
        Ok(())
    }

    /// Polls the keyboard for 1 ms; true when the quit key was pressed.
    pub fn should_quit(&self) -> Result<bool> {
        let key = highgui::wait_key(1)?;
        Ok(is_quit_key(key))
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.title) {
            warn!("Failed to close window '{}': {}", self.title, e);
        }
    }
}

fn is_quit_key(key: i32) -> bool {
    key >= 0 && (key & 0xFF) == QUIT_KEY
}
