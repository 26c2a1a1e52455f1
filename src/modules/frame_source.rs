use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Provides the frame indices landmarks are extracted from.
pub trait FrameSource {
    /// Available frame indices in ascending order.
    fn frame_indices(&self) -> Result<Vec<usize>>;

    /// (Re)populate the frames, e.g. by decoding a video. After a successful
    /// call `frame_indices` reports the acquired frames.
    fn acquire_frames(&self) -> Result<()>;

    /// Where the frames live, for diagnostics.
    fn location(&self) -> PathBuf;
}

/// A directory of zero-padded frame images such as `0000.jpeg`, `0001.jpeg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDirectory {
    pub frames_dir: PathBuf,
    pub suffix: String,
    pub num_len: usize,
}

impl FrameDirectory {
    pub fn new(frames_dir: impl Into<PathBuf>) -> Self {
        FrameDirectory {
            frames_dir: frames_dir.into(),
            suffix: ".jpeg".to_string(),
            num_len: 4,
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_num_len(mut self, num_len: usize) -> Self {
        self.num_len = num_len;
        self
    }

    /// file_path builds the image path of a frame number.
    pub fn file_path(&self, frame_index: usize) -> PathBuf {
        self.frames_dir.join(format!(
            "{:0width$}{}",
            frame_index,
            self.suffix,
            width = self.num_len
        ))
    }

    /// ffmpeg output pattern matching `file_path`.
    pub fn output_pattern(&self) -> PathBuf {
        self.frames_dir
            .join(format!("%0{}d{}", self.num_len, self.suffix))
    }

    fn parse_index(&self, path: &Path) -> Option<usize> {
        let name = path.file_name()?.to_str()?;
        name.strip_suffix(self.suffix.as_str())?.parse().ok()
    }
}

impl FrameSource for FrameDirectory {
    fn frame_indices(&self) -> Result<Vec<usize>> {
        if !self.frames_dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.frames_dir)
            .with_context(|| format!("listing {}", self.frames_dir.display()))?;
        let mut indices = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(idx) = self.parse_index(&entry.path()) {
                indices.push(idx);
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }

    fn acquire_frames(&self) -> Result<()> {
        bail!(
            "no frames in {} and no video to decode them from",
            self.frames_dir.display()
        )
    }

    fn location(&self) -> PathBuf {
        self.frames_dir.clone()
    }
}

/// Decodes a video into a `FrameDirectory` with the ffmpeg CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFrameSource {
    pub frames: FrameDirectory,
    pub video: PathBuf,
    pub ffmpeg: PathBuf,
    pub start_number: usize,
    pub quality: u32,
}

impl VideoFrameSource {
    pub fn new(frames: FrameDirectory, video: impl Into<PathBuf>) -> Self {
        VideoFrameSource {
            frames,
            video: video.into(),
            ffmpeg: PathBuf::from("ffmpeg"),
            start_number: 0,
            quality: 5,
        }
    }

    fn extract_command(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-i")
            .arg(&self.video)
            .arg("-start_number")
            .arg(self.start_number.to_string())
            .arg("-qscale:v")
            .arg(self.quality.to_string())
            .arg(self.frames.output_pattern());
        cmd
    }
}

impl FrameSource for VideoFrameSource {
    fn frame_indices(&self) -> Result<Vec<usize>> {
        self.frames.frame_indices()
    }

    fn acquire_frames(&self) -> Result<()> {
        let dir = &self.frames.frames_dir;
        if dir.is_dir() {
            std::fs::remove_dir_all(dir)
                .with_context(|| format!("clearing {}", dir.display()))?;
        }
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

        info!(video = %self.video.display(), frames_dir = %dir.display(), "extracting frames");
        let mut cmd = self.extract_command();
        debug!(?cmd, "running ffmpeg");
        let output = cmd
            .output()
            .with_context(|| format!("spawning {}", self.ffmpeg.display()))?;
        if !output.status.success() {
            bail!(
                "ffmpeg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    fn location(&self) -> PathBuf {
        self.frames.frames_dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_zero_padded() {
        let frames = FrameDirectory::new("frames");
        assert_eq!(frames.file_path(30), PathBuf::from("frames/0030.jpeg"));
        let frames = frames.with_suffix(".png").with_num_len(6);
        assert_eq!(frames.file_path(7), PathBuf::from("frames/000007.png"));
        assert_eq!(frames.output_pattern(), PathBuf::from("frames/%06d.png"));
    }

    #[test]
    fn test_frame_indices_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["0002.jpeg", "0000.jpeg", "0010.jpeg", "notes.txt", "cover.jpeg"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let frames = FrameDirectory::new(dir.path());
        assert_eq!(frames.frame_indices().unwrap(), vec![0, 2, 10]);
    }

    #[test]
    fn test_missing_directory_has_no_frames() {
        let dir = tempfile::tempdir().unwrap();
        let frames = FrameDirectory::new(dir.path().join("absent"));
        assert!(frames.frame_indices().unwrap().is_empty());
        assert!(frames.acquire_frames().is_err());
    }

    #[test]
    fn test_extract_command_args() {
        let source = VideoFrameSource::new(FrameDirectory::new("frames"), "clip.mp4");
        let cmd = source.extract_command();
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["-i", "clip.mp4", "-start_number", "0", "-qscale:v", "5", "frames/%04d.jpeg"]
        );
    }

    #[test]
    fn test_acquire_reports_ffmpeg_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = VideoFrameSource::new(FrameDirectory::new(dir.path().join("f")), "clip.mp4");
        source.ffmpeg = dir.path().join("no-such-ffmpeg");
        assert!(source.acquire_frames().is_err());
    }
}
