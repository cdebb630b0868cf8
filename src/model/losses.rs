//! Adversarial and mutual-information objectives. Every logarithm of a
//! probability goes through [`eps_log`].

use burn::prelude::*;

use crate::model::{ali::JointScores, constants::LOG_EPSILON};

/// `log(x + 1e-8)`
pub fn eps_log<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
    x.add_scalar(LOG_EPSILON).log()
}

fn complement<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
    x.neg().add_scalar(1.0)
}

/// `-mean(log D(x, Q(x)) + log(1 - D(P(z), z)))`
pub fn ali_discriminator_loss<B: Backend>(scores: &JointScores<B>) -> Tensor<B, 1> {
    (eps_log(scores.encoder.clone()) + eps_log(complement(scores.generator.clone())))
        .mean()
        .neg()
}

/// `-mean(log D(P(z), z) + log(1 - D(x, Q(x))))`
pub fn ali_generator_loss<B: Backend>(scores: &JointScores<B>) -> Tensor<B, 1> {
    (eps_log(scores.generator.clone()) + eps_log(complement(scores.encoder.clone())))
        .mean()
        .neg()
}

/// `-mean(log D(x, Q(x)))`, logged as `d_enc`.
pub fn ali_encoder_score<B: Backend>(scores: &JointScores<B>) -> Tensor<B, 1> {
    eps_log(scores.encoder.clone()).mean().neg()
}

/// `-mean(log D(P(z), z))`, logged as `d_gen`.
pub fn ali_generator_score<B: Backend>(scores: &JointScores<B>) -> Tensor<B, 1> {
    eps_log(scores.generator.clone()).mean().neg()
}

/// `-mean(log D(x) + log(1 - D(G(z, c))))`
pub fn gan_discriminator_loss<B: Backend>(
    real_scores: Tensor<B, 2>,
    fake_scores: Tensor<B, 2>,
) -> Tensor<B, 1> {
    (eps_log(real_scores) + eps_log(complement(fake_scores)))
        .mean()
        .neg()
}

/// `-mean(log D(G(z, c)))`
pub fn gan_generator_loss<B: Backend>(fake_scores: Tensor<B, 2>) -> Tensor<B, 1> {
    eps_log(fake_scores).mean().neg()
}

/// `mean(-sum(log Q(c | G(z, c)) * c)) + mean(-sum(log c * c))`
///
/// The entropy term is constant for one-hot codes and only offsets the value.
pub fn mutual_info_loss<B: Backend>(posterior: Tensor<B, 2>, code: Tensor<B, 2>) -> Tensor<B, 1> {
    let cross_entropy = (eps_log(posterior) * code.clone()).sum_dim(1).neg().mean();
    let entropy = (eps_log(code.clone()) * code).sum_dim(1).neg().mean();
    cross_entropy + entropy
}
