use crate::model::{
    ali::{AliModelConfig, EncoderDecoder, JointDiscriminator},
    data::MinibatchSampler,
    losses::{ali_discriminator_loss, ali_encoder_score, ali_generator_loss, ali_generator_score},
    sampling::sample_uniform,
    training::{
        config_path, create_artifact_dir, emit_images, emit_scalars, progress_bar,
        report_non_finite,
    },
};
use crate::utils::summary::{SummarySink, SummaryWriter};

use anyhow::{Context, anyhow, ensure};
use burn::{
    data::dataset::{
        Dataset,
        vision::{MnistDataset, MnistItem},
    },
    optim::{Adam, AdamConfig, GradientsParams, Optimizer, adaptor::OptimizerAdaptor},
    prelude::*,
    tensor::{ElementConversion, backend::AutodiffBackend},
};
use log::info;
use rand::{SeedableRng, rngs::StdRng};

#[derive(Config)]
pub struct AliTrainingConfig {
    pub model: AliModelConfig,
    pub optimizer: AdamConfig,

    #[config(default = 1_000_000)]
    pub num_iterations: usize,

    #[config(default = 32)]
    pub batch_size: usize,

    #[config(default = 1e-3)]
    pub learning_rate: f64,

    #[config(default = 1000)]
    pub log_every: usize,

    #[config(default = 42)]
    pub seed: u64,
}

impl AliTrainingConfig {
    /// Adam with beta1 0.9, beta2 0.999 and epsilon 1e-8.
    pub fn with_defaults() -> Self {
        Self::new(AliModelConfig::new(), AdamConfig::new().with_epsilon(1e-8))
    }
}

/// Losses of one training iteration.
#[derive(Debug, Clone, Copy)]
pub struct AliLosses {
    pub discriminator: f32,
    pub generator: f32,
}

/// Owns both parameter subsets and the Adam state of each objective.
pub struct AliTrainer<B: AutodiffBackend> {
    pub encoder_decoder: EncoderDecoder<B>,
    pub discriminator: JointDiscriminator<B>,
    optim_d: OptimizerAdaptor<Adam, JointDiscriminator<B>, B>,
    optim_g: OptimizerAdaptor<Adam, EncoderDecoder<B>, B>,
    learning_rate: f64,
    latent_dim: usize,
    rng: StdRng,
    device: B::Device,
}

impl<B: AutodiffBackend> AliTrainer<B> {
    pub fn new(config: &AliTrainingConfig, device: &B::Device) -> Self {
        B::seed(config.seed);

        Self {
            encoder_decoder: config.model.init_encoder_decoder(device),
            discriminator: config.model.init_discriminator(device),
            optim_d: config.optimizer.init(),
            optim_g: config.optimizer.init(),
            learning_rate: config.learning_rate,
            latent_dim: config.model.latent_dim,
            rng: StdRng::seed_from_u64(config.seed),
            device: device.clone(),
        }
    }

    pub fn sample_latent(&mut self, m: usize) -> Tensor<B, 2> {
        sample_uniform(&mut self.rng, m, self.latent_dim, &self.device)
    }

    /// Updates the discriminator only. The encoder and decoder outputs are
    /// detached, and only discriminator gradients reach the optimizer.
    pub fn discriminator_step(&mut self, images: Tensor<B, 2>, latent: Tensor<B, 2>) -> f32 {
        let scores = self
            .encoder_decoder
            .score(&self.discriminator, images, latent, true);
        let loss_d = ali_discriminator_loss(&scores);
        let value = loss_d.clone().into_scalar().elem::<f32>();

        let grads_d = GradientsParams::from_grads(loss_d.backward(), &self.discriminator);
        self.discriminator =
            self.optim_d
                .step(self.learning_rate, self.discriminator.clone(), grads_d);
        value
    }

    /// Updates encoder and decoder only, from a fresh forward pass.
    pub fn generator_step(&mut self, images: Tensor<B, 2>, latent: Tensor<B, 2>) -> f32 {
        let scores = self
            .encoder_decoder
            .score(&self.discriminator, images, latent, false);
        let loss_g = ali_generator_loss(&scores);
        let value = loss_g.clone().into_scalar().elem::<f32>();

        let grads_g = GradientsParams::from_grads(loss_g.backward(), &self.encoder_decoder);
        self.encoder_decoder =
            self.optim_g
                .step(self.learning_rate, self.encoder_decoder.clone(), grads_g);
        value
    }

    /// One iteration: a single latent batch shared by the discriminator step
    /// and the encoder/decoder step that follows it.
    pub fn step(&mut self, images: Tensor<B, 2>) -> AliLosses {
        let latent = self.sample_latent(images.dims()[0]);

        let discriminator = self.discriminator_step(images.clone(), latent.clone());
        let generator = self.generator_step(images, latent);

        AliLosses {
            discriminator,
            generator,
        }
    }

    /// Scores a batch against a fresh latent sample without updating anything
    /// and hands the scalars and generated images to the sink.
    pub fn write_summary(
        &mut self,
        sink: &mut dyn SummarySink,
        images: Tensor<B, 2>,
        iteration: usize,
    ) {
        let latent = self.sample_latent(images.dims()[0]);
        let scores = self
            .encoder_decoder
            .score(&self.discriminator, images, latent.clone(), true);

        let scalars = [
            ("d_enc", ali_encoder_score(&scores)),
            ("d_gen", ali_generator_score(&scores)),
            ("d_loss", ali_discriminator_loss(&scores)),
            ("g_loss", ali_generator_loss(&scores)),
        ]
        .map(|(tag, loss)| (tag, loss.into_scalar().elem::<f32>()));
        emit_scalars(sink, &scalars, iteration);

        let fake = self.encoder_decoder.decoder.forward(latent).detach();
        let fake = fake
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|err| anyhow!("failed to read generated images: {err:?}"));
        emit_images(sink, "fake", fake, iteration);
    }
}

impl AliTrainingConfig {
    /// Rejects settings the training loop cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.batch_size > 0, "batch_size must be positive");
        ensure!(self.log_every > 0, "log_every must be positive");
        Ok(())
    }
}

pub fn train<B: AutodiffBackend>(
    artifact_dir: &str,
    config: AliTrainingConfig,
    device: B::Device,
) -> anyhow::Result<()> {
    config.validate()?;
    create_artifact_dir(artifact_dir)?;
    config
        .save(config_path(artifact_dir))
        .context("failed to save training config")?;

    let mut sampler = MinibatchSampler::new(MnistDataset::train(), config.seed)?;
    let mut summary = SummaryWriter::new(format!("{artifact_dir}/summaries"))?;
    info!(
        "ALI: {} training images, {} iterations, device {:?}",
        sampler.len(),
        config.num_iterations,
        device
    );

    run::<B, _>(&config, &mut sampler, &mut summary, &device)?;
    info!("ALI finished after {} epochs", sampler.epochs());
    Ok(())
}

/// The training loop. Every `log_every` iterations the losses are logged and
/// the iteration's own minibatch is summarized after its updates.
pub fn run<B: AutodiffBackend, D: Dataset<MnistItem>>(
    config: &AliTrainingConfig,
    sampler: &mut MinibatchSampler<D>,
    sink: &mut dyn SummarySink,
    device: &B::Device,
) -> anyhow::Result<AliTrainer<B>> {
    config.validate()?;
    let mut trainer = AliTrainer::<B>::new(config, device);
    let progress = progress_bar(config.num_iterations);

    for iteration in 0..config.num_iterations {
        let batch = sampler.next_batch::<B>(config.batch_size, device)?;
        let losses = trainer.step(batch.images.clone());
        report_non_finite(
            &[("D_loss", losses.discriminator), ("G_loss", losses.generator)],
            iteration,
        );

        if iteration % config.log_every == 0 {
            info!(
                "Iter: {}; D_loss: {:.4}; G_loss: {:.4}",
                iteration, losses.discriminator, losses.generator
            );
            trainer.write_summary(sink, batch.images, iteration);
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(trainer)
}
