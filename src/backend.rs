//! Compile-time backend selection. CPU by default, CUDA with the `cuda` feature.

use burn::backend::Autodiff;
use burn::prelude::Backend;

#[cfg(feature = "cuda")]
pub type ComputeBackend = burn::backend::Cuda<f32, i32>;

#[cfg(not(feature = "cuda"))]
pub type ComputeBackend = burn::backend::NdArray<f32>;

pub type TrainingBackend = Autodiff<ComputeBackend>;

pub type TrainingDevice = <TrainingBackend as Backend>::Device;

/// The device every tensor of a training run lives on.
pub fn default_device() -> TrainingDevice {
    TrainingDevice::default()
}
