pub mod ali;
pub mod infogan;

use anyhow::Context;
use indicatif::ProgressBar;
use log::warn;
use std::path::Path;

use crate::utils::summary::SummarySink;

pub(crate) fn create_artifact_dir(artifact_dir: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(artifact_dir)
        .with_context(|| format!("failed to create artifact directory {artifact_dir}"))
}

pub(crate) fn config_path(artifact_dir: &str) -> String {
    Path::new(artifact_dir)
        .join("config.json")
        .to_string_lossy()
        .into_owned()
}

pub(crate) fn progress_bar(num_iterations: usize) -> ProgressBar {
    ProgressBar::new(num_iterations as u64)
}

/// Logs a warning for every non-finite loss; training carries on regardless.
pub(crate) fn report_non_finite(losses: &[(&str, f32)], iteration: usize) {
    for (tag, value) in losses {
        if !value.is_finite() {
            warn!("iteration {iteration}: {tag} is not finite ({value})");
        }
    }
}

/// Writes scalars to the sink, logging instead of failing.
pub(crate) fn emit_scalars(sink: &mut dyn SummarySink, scalars: &[(&str, f32)], iteration: usize) {
    for (tag, value) in scalars {
        if let Err(err) = sink.add_scalar(tag, *value, iteration) {
            warn!("iteration {iteration}: dropped scalar {tag}: {err:#}");
        }
    }
}

/// Writes an image batch to the sink, logging instead of failing.
pub(crate) fn emit_images(
    sink: &mut dyn SummarySink,
    tag: &str,
    images: anyhow::Result<Vec<f32>>,
    iteration: usize,
) {
    let written = images.and_then(|images| sink.add_images(tag, &images, iteration));
    if let Err(err) = written {
        warn!("iteration {iteration}: dropped images {tag}: {err:#}");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::constants::{HEIGHT, WIDTH};
    use anyhow::bail;
    use burn::data::dataset::{InMemDataset, vision::MnistItem};

    /// A few gray MNIST-shaped items for driving the training loops.
    pub(crate) fn tiny_mnist(len: usize) -> InMemDataset<MnistItem> {
        InMemDataset::new(
            (0..len)
                .map(|i| MnistItem {
                    image: [[(i * 25 % 256) as f32; WIDTH]; HEIGHT],
                    label: (i % 10) as u8,
                })
                .collect(),
        )
    }

    pub(crate) fn image_steps(sink: &RecordingSink) -> Vec<usize> {
        sink.images.iter().map(|(_, _, step)| *step).collect()
    }

    /// Sink that refuses every write.
    pub(crate) struct UnreachableSink {
        pub attempts: usize,
    }

    impl SummarySink for UnreachableSink {
        fn add_scalar(&mut self, _tag: &str, _value: f32, _step: usize) -> anyhow::Result<()> {
            self.attempts += 1;
            bail!("sink offline")
        }

        fn add_images(&mut self, _tag: &str, _images: &[f32], _step: usize) -> anyhow::Result<()> {
            self.attempts += 1;
            bail!("sink offline")
        }
    }

    /// Sink that keeps everything in memory.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub scalars: Vec<(String, f32, usize)>,
        pub images: Vec<(String, usize, usize)>,
    }

    impl SummarySink for RecordingSink {
        fn add_scalar(&mut self, tag: &str, value: f32, step: usize) -> anyhow::Result<()> {
            self.scalars.push((tag.to_string(), value, step));
            Ok(())
        }

        fn add_images(&mut self, tag: &str, images: &[f32], step: usize) -> anyhow::Result<()> {
            self.images.push((tag.to_string(), images.len(), step));
            Ok(())
        }
    }

    #[test]
    fn failing_sink_does_not_abort() {
        let mut sink = UnreachableSink { attempts: 0 };
        emit_scalars(&mut sink, &[("d_loss", 1.0), ("g_loss", 2.0)], 0);
        emit_images(&mut sink, "fake", Ok(vec![0.0; 784]), 0);
        emit_images(&mut sink, "fake", Err(anyhow::anyhow!("no data")), 0);
        assert_eq!(sink.attempts, 3);
    }

    #[test]
    fn artifact_dir_is_created_when_absent() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("out").join("ali");
        let dir = dir.to_str().unwrap();

        create_artifact_dir(dir).unwrap();
        create_artifact_dir(dir).unwrap();
        assert!(Path::new(dir).is_dir());
        assert!(config_path(dir).ends_with("config.json"));
    }
}
