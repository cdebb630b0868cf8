use crate::model::{
    data::MinibatchSampler,
    infogan::{CodePredictor, Discriminator, Generator, InfoGanModelConfig, InfoPair},
    losses::{gan_discriminator_loss, gan_generator_loss, mutual_info_loss},
    sampling::{fixed_code, sample_code, sample_uniform},
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
use log::{debug, info};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Generated images handed to the sink per summary.
const SUMMARY_IMAGES: usize = 16;

#[derive(Config)]
pub struct InfoGanTrainingConfig {
    pub model: InfoGanModelConfig,
    pub optimizer: AdamConfig,

    #[config(default = 10_000_000)]
    pub num_iterations: usize,

    #[config(default = 32)]
    pub batch_size: usize,

    #[config(default = 1e-3)]
    pub learning_rate: f64,

    #[config(default = 1000)]
    pub log_every: usize,

    #[config(default = 100)]
    pub summary_every: usize,

    #[config(default = 42)]
    pub seed: u64,
}

impl InfoGanTrainingConfig {
    /// Adam with beta1 0.9, beta2 0.999 and epsilon 1e-8.
    pub fn with_defaults() -> Self {
        Self::new(InfoGanModelConfig::new(), AdamConfig::new().with_epsilon(1e-8))
    }
}

/// Losses of one training iteration.
#[derive(Debug, Clone, Copy)]
pub struct InfoGanLosses {
    pub discriminator: f32,
    pub generator: f32,
    pub mutual_info: f32,
}

/// Noise and categorical code fed to the generator.
#[derive(Debug, Clone)]
pub struct LatentBatch<B: Backend> {
    pub noise: Tensor<B, 2>,
    pub code: Tensor<B, 2>,
}

/// Owns the three networks. The generator is shared by the adversarial step
/// and the mutual-information step, each with its own Adam state.
pub struct InfoGanTrainer<B: AutodiffBackend> {
    pub discriminator: Discriminator<B>,
    pub generator: Generator<B>,
    pub predictor: CodePredictor<B>,
    optim_d: OptimizerAdaptor<Adam, Discriminator<B>, B>,
    optim_g: OptimizerAdaptor<Adam, Generator<B>, B>,
    optim_q: OptimizerAdaptor<Adam, InfoPair<B>, B>,
    learning_rate: f64,
    noise_dim: usize,
    code_dim: usize,
    rng: StdRng,
    device: B::Device,
}

impl<B: AutodiffBackend> InfoGanTrainer<B> {
    pub fn new(config: &InfoGanTrainingConfig, device: &B::Device) -> Self {
        B::seed(config.seed);

        Self {
            discriminator: config.model.init_discriminator(device),
            generator: config.model.init_generator(device),
            predictor: config.model.init_predictor(device),
            optim_d: config.optimizer.init(),
            optim_g: config.optimizer.init(),
            optim_q: config.optimizer.init(),
            learning_rate: config.learning_rate,
            noise_dim: config.model.noise_dim,
            code_dim: config.model.code_dim,
            rng: StdRng::seed_from_u64(config.seed),
            device: device.clone(),
        }
    }

    /// Uniform noise with codes drawn independently per row.
    pub fn sample_latent(&mut self, m: usize) -> LatentBatch<B> {
        LatentBatch {
            noise: sample_uniform(&mut self.rng, m, self.noise_dim, &self.device),
            code: sample_code(&mut self.rng, m, self.code_dim, &self.device),
        }
    }

    /// Uniform noise with every row carrying the same code `class`.
    pub fn sample_latent_for_class(&mut self, m: usize, class: usize) -> LatentBatch<B> {
        LatentBatch {
            noise: sample_uniform(&mut self.rng, m, self.noise_dim, &self.device),
            code: fixed_code(class, m, self.code_dim, &self.device),
        }
    }

    pub fn discriminator_step(&mut self, images: Tensor<B, 2>, latent: LatentBatch<B>) -> f32 {
        let fake = self.generator.forward(latent.noise, latent.code).detach();
        let loss_d = gan_discriminator_loss(
            self.discriminator.forward(images),
            self.discriminator.forward(fake),
        );
        let value = loss_d.clone().into_scalar().elem::<f32>();

        let grads_d = GradientsParams::from_grads(loss_d.backward(), &self.discriminator);
        self.discriminator =
            self.optim_d
                .step(self.learning_rate, self.discriminator.clone(), grads_d);
        value
    }

    pub fn generator_step(&mut self, latent: LatentBatch<B>) -> f32 {
        let fake = self.generator.forward(latent.noise, latent.code);
        let loss_g = gan_generator_loss(self.discriminator.forward(fake));
        let value = loss_g.clone().into_scalar().elem::<f32>();

        let grads_g = GradientsParams::from_grads(loss_g.backward(), &self.generator);
        self.generator = self
            .optim_g
            .step(self.learning_rate, self.generator.clone(), grads_g);
        value
    }

    /// Minimizes the mutual-information loss over generator and predictor
    /// together.
    pub fn predictor_step(&mut self, latent: LatentBatch<B>) -> f32 {
        let pair = InfoPair {
            generator: self.generator.clone(),
            predictor: self.predictor.clone(),
        };
        let fake = pair.generator.forward(latent.noise, latent.code.clone());
        let loss_q = mutual_info_loss(pair.predictor.forward(fake), latent.code);
        let value = loss_q.clone().into_scalar().elem::<f32>();

        let grads_q = GradientsParams::from_grads(loss_q.backward(), &pair);
        let InfoPair {
            generator,
            predictor,
        } = self.optim_q.step(self.learning_rate, pair, grads_q);
        self.generator = generator;
        self.predictor = predictor;
        value
    }

    /// One iteration. The discriminator step draws its own latent batch; the
    /// generator and predictor steps share a second one.
    pub fn step(&mut self, images: Tensor<B, 2>) -> InfoGanLosses {
        let batch_size = images.dims()[0];

        let latent_d = self.sample_latent(batch_size);
        let discriminator = self.discriminator_step(images, latent_d);

        let latent_g = self.sample_latent(batch_size);
        let generator = self.generator_step(latent_g.clone());
        let mutual_info = self.predictor_step(latent_g);

        InfoGanLosses {
            discriminator,
            generator,
            mutual_info,
        }
    }

    /// Evaluates all three losses on `images` and a latent batch whose code is
    /// one randomly chosen class, then hands scalars and generated images to
    /// the sink. Nothing is updated. Returns the chosen class.
    pub fn write_summary(
        &mut self,
        sink: &mut dyn SummarySink,
        images: Tensor<B, 2>,
        iteration: usize,
    ) -> usize {
        let class = self.rng.random_range(0..self.code_dim);
        let latent = self.sample_latent_for_class(images.dims()[0], class);

        let fake = self
            .generator
            .forward(latent.noise, latent.code.clone())
            .detach();
        let fake_scores = self.discriminator.forward(fake.clone());
        let scalars = [
            (
                "d_loss",
                gan_discriminator_loss(self.discriminator.forward(images), fake_scores.clone()),
            ),
            ("g_loss", gan_generator_loss(fake_scores)),
            (
                "q_loss",
                mutual_info_loss(self.predictor.forward(fake.clone()), latent.code),
            ),
        ]
        .map(|(tag, loss)| (tag, loss.into_scalar().elem::<f32>()));
        emit_scalars(sink, &scalars, iteration);

        let [rows, cols] = fake.dims();
        let shown = rows.min(SUMMARY_IMAGES);
        let fake = fake
            .slice([0..shown, 0..cols])
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|err| anyhow!("failed to read generated images: {err:?}"));
        emit_images(sink, "fake", fake, iteration);
        class
    }
}

impl InfoGanTrainingConfig {
    /// Rejects settings the training loop cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.batch_size > 0, "batch_size must be positive");
        ensure!(self.log_every > 0, "log_every must be positive");
        ensure!(self.summary_every > 0, "summary_every must be positive");
        Ok(())
    }
}

pub fn train<B: AutodiffBackend>(
    artifact_dir: &str,
    config: InfoGanTrainingConfig,
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
        "InfoGAN: {} training images, {} iterations, device {:?}",
        sampler.len(),
        config.num_iterations,
        device
    );

    run::<B, _>(&config, &mut sampler, &mut summary, &device)?;
    info!("InfoGAN finished after {} epochs", sampler.epochs());
    Ok(())
}

/// The training loop. Every `summary_every` iterations a separate minibatch
/// is drawn and summarized before that iteration's updates.
pub fn run<B: AutodiffBackend, D: Dataset<MnistItem>>(
    config: &InfoGanTrainingConfig,
    sampler: &mut MinibatchSampler<D>,
    sink: &mut dyn SummarySink,
    device: &B::Device,
) -> anyhow::Result<InfoGanTrainer<B>> {
    config.validate()?;
    let mut trainer = InfoGanTrainer::<B>::new(config, device);
    let progress = progress_bar(config.num_iterations);

    for iteration in 0..config.num_iterations {
        if iteration % config.summary_every == 0 {
            let batch = sampler.next_batch::<B>(config.batch_size, device)?;
            let class = trainer.write_summary(sink, batch.images, iteration);
            debug!("iteration {iteration}: summary generated with code {class}");
        }

        let batch = sampler.next_batch::<B>(config.batch_size, device)?;
        let losses = trainer.step(batch.images);
        report_non_finite(
            &[
                ("D_loss", losses.discriminator),
                ("G_loss", losses.generator),
                ("Q_loss", losses.mutual_info),
            ],
            iteration,
        );

        if iteration % config.log_every == 0 {
            info!(
                "Iter: {}; D_loss: {:.4}; G_loss: {:.4}; Q_loss: {:.4}",
                iteration, losses.discriminator, losses.generator, losses.mutual_info
            );
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(trainer)
}
