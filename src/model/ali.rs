//! Adversarially learned inference: an encoder `Q(x)`, a decoder `P(z)` and a
//! discriminator scoring joint `(x, z)` pairs.

use burn::{nn::Sigmoid, prelude::*};

use crate::model::{
    architecture::{Perceptron, PerceptronConfig},
    constants::{ALI_HIDDEN_DIM, ALI_LATENT_DIM, IMAGE_DIM},
};

/// `Q(x)`: image to latent code, linear output.
#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    net: Perceptron<B>,
}

/// `P(z)`: latent code to image, sigmoid output.
#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    net: Perceptron<B>,
    activation: Sigmoid,
}

/// `D(x, z)`: probability that a joint pair came from the encoder.
#[derive(Module, Debug)]
pub struct JointDiscriminator<B: Backend> {
    net: Perceptron<B>,
    activation: Sigmoid,
}

/// Encoder and decoder trained together against the discriminator.
#[derive(Module, Debug)]
pub struct EncoderDecoder<B: Backend> {
    pub encoder: Encoder<B>,
    pub decoder: Decoder<B>,
}

#[derive(Config, Debug)]
pub struct AliModelConfig {
    #[config(default = "IMAGE_DIM")]
    pub image_dim: usize,
    #[config(default = "ALI_LATENT_DIM")]
    pub latent_dim: usize,
    #[config(default = "ALI_HIDDEN_DIM")]
    pub hidden_dim: usize,
}

impl AliModelConfig {
    pub fn init_encoder_decoder<B: Backend>(&self, device: &B::Device) -> EncoderDecoder<B> {
        EncoderDecoder {
            encoder: Encoder {
                net: PerceptronConfig::new(self.image_dim, self.hidden_dim, self.latent_dim)
                    .init(device),
            },
            decoder: Decoder {
                net: PerceptronConfig::new(self.latent_dim, self.hidden_dim, self.image_dim)
                    .init(device),
                activation: Sigmoid::new(),
            },
        }
    }

    pub fn init_discriminator<B: Backend>(&self, device: &B::Device) -> JointDiscriminator<B> {
        JointDiscriminator {
            net: PerceptronConfig::new(self.image_dim + self.latent_dim, self.hidden_dim, 1)
                .init(device),
            activation: Sigmoid::new(),
        }
    }
}

impl<B: Backend> Encoder<B> {
    pub fn forward(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        self.net.forward(images)
    }
}

impl<B: Backend> Decoder<B> {
    pub fn forward(&self, latent: Tensor<B, 2>) -> Tensor<B, 2> {
        self.activation.forward(self.net.forward(latent))
    }
}

impl<B: Backend> JointDiscriminator<B> {
    pub fn forward(&self, images: Tensor<B, 2>, latent: Tensor<B, 2>) -> Tensor<B, 2> {
        let joint = Tensor::cat(vec![images, latent], 1);
        self.activation.forward(self.net.forward(joint))
    }
}

/// Discriminator scores of one ALI forward pass.
#[derive(Debug, Clone)]
pub struct JointScores<B: Backend> {
    /// `D(x, Q(x))`
    pub encoder: Tensor<B, 2>,
    /// `D(P(z), z)`
    pub generator: Tensor<B, 2>,
}

impl<B: Backend> EncoderDecoder<B> {
    /// Scores the encoder pair `(x, Q(x))` and the generator pair `(P(z), z)`.
    /// With `detach` the discriminator sees constants, so no gradient reaches
    /// the encoder or decoder.
    pub fn score(
        &self,
        discriminator: &JointDiscriminator<B>,
        images: Tensor<B, 2>,
        latent: Tensor<B, 2>,
        detach: bool,
    ) -> JointScores<B> {
        let mut inferred = self.encoder.forward(images.clone());
        let mut generated = self.decoder.forward(latent.clone());
        if detach {
            inferred = inferred.detach();
            generated = generated.detach();
        }

        JointScores {
            encoder: discriminator.forward(images, inferred),
            generator: discriminator.forward(generated, latent),
        }
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Vec<Vec<f32>> {
        let mut params = self.encoder.net.snapshot();
        params.extend(self.decoder.net.snapshot());
        params
    }
}

#[cfg(test)]
impl<B: Backend> JointDiscriminator<B> {
    pub(crate) fn snapshot(&self) -> Vec<Vec<f32>> {
        self.net.snapshot()
    }
}
