use anyhow::{Context, anyhow};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::utils::sample_grid;

/// Destination for training scalars and image batches, tagged by iteration.
pub trait SummarySink {
    fn add_scalar(&mut self, tag: &str, value: f32, step: usize) -> anyhow::Result<()>;

    /// `images` holds whole flattened 28x28 images back to back.
    fn add_images(&mut self, tag: &str, images: &[f32], step: usize) -> anyhow::Result<()>;
}

/// Writes scalars to `<dir>/scalars.csv` and image grids to `<dir>/<tag>/<step>.png`.
pub struct SummaryWriter {
    dir: PathBuf,
}

impl SummaryWriter {
    pub fn new<P: Into<PathBuf>>(dir: P) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create summary directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn scalars_path(&self) -> PathBuf {
        self.dir.join("scalars.csv")
    }

    pub fn image_path(&self, tag: &str, step: usize) -> PathBuf {
        self.dir.join(tag).join(format!("{step:08}.png"))
    }
}

impl SummarySink for SummaryWriter {
    fn add_scalar(&mut self, tag: &str, value: f32, step: usize) -> anyhow::Result<()> {
        let path = self.scalars_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        writeln!(file, "{step},{tag},{value}")?;
        Ok(())
    }

    fn add_images(&mut self, tag: &str, images: &[f32], step: usize) -> anyhow::Result<()> {
        let grid = sample_grid(images).ok_or_else(|| anyhow!("cannot render {tag} batch"))?;
        let path = self.image_path(tag, step);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        grid.save(&path)
            .with_context(|| format!("failed to save {}", path.display()))
    }
}
