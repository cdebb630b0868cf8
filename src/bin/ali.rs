use env_logger::Env;
use log::info;
use mnist_adversarial::{
    backend::{TrainingBackend, default_device},
    model::training::ali::{AliTrainingConfig, train},
};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let artifact_dir = "out/ali";
    let device = default_device();
    let config = AliTrainingConfig::with_defaults();
    info!("writing artifacts to {artifact_dir}");

    train::<TrainingBackend>(artifact_dir, config, device)
}
