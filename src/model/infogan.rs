//! InfoGAN: a generator conditioned on a categorical code, a real/fake
//! discriminator and an auxiliary network predicting the code back.

use burn::{
    nn::Sigmoid,
    prelude::*,
    tensor::activation::softmax,
};

use crate::model::{
    architecture::{Perceptron, PerceptronConfig},
    constants::{
        IMAGE_DIM, INFOGAN_CODE_DIM, INFOGAN_GENERATOR_HIDDEN_DIM, INFOGAN_HIDDEN_DIM,
        INFOGAN_NOISE_DIM,
    },
};

/// `D(x)`: probability that an image is real.
#[derive(Module, Debug)]
pub struct Discriminator<B: Backend> {
    net: Perceptron<B>,
    activation: Sigmoid,
}

/// `G(z, c)`: noise and one-hot code to image.
#[derive(Module, Debug)]
pub struct Generator<B: Backend> {
    net: Perceptron<B>,
    activation: Sigmoid,
}

/// `Q(x)`: posterior over the categorical code.
#[derive(Module, Debug)]
pub struct CodePredictor<B: Backend> {
    net: Perceptron<B>,
}

/// Generator and predictor, optimized together on the mutual-information term.
#[derive(Module, Debug)]
pub struct InfoPair<B: Backend> {
    pub generator: Generator<B>,
    pub predictor: CodePredictor<B>,
}

#[derive(Config, Debug)]
pub struct InfoGanModelConfig {
    #[config(default = "IMAGE_DIM")]
    pub image_dim: usize,
    #[config(default = "INFOGAN_NOISE_DIM")]
    pub noise_dim: usize,
    #[config(default = "INFOGAN_CODE_DIM")]
    pub code_dim: usize,
    #[config(default = "INFOGAN_GENERATOR_HIDDEN_DIM")]
    pub generator_hidden_dim: usize,
    #[config(default = "INFOGAN_HIDDEN_DIM")]
    pub hidden_dim: usize,
}

impl InfoGanModelConfig {
    pub fn init_discriminator<B: Backend>(&self, device: &B::Device) -> Discriminator<B> {
        Discriminator {
            net: PerceptronConfig::new(self.image_dim, self.hidden_dim, 1).init(device),
            activation: Sigmoid::new(),
        }
    }

    pub fn init_generator<B: Backend>(&self, device: &B::Device) -> Generator<B> {
        Generator {
            net: PerceptronConfig::new(
                self.noise_dim + self.code_dim,
                self.generator_hidden_dim,
                self.image_dim,
            )
            .init(device),
            activation: Sigmoid::new(),
        }
    }

    pub fn init_predictor<B: Backend>(&self, device: &B::Device) -> CodePredictor<B> {
        CodePredictor {
            net: PerceptronConfig::new(self.image_dim, self.hidden_dim, self.code_dim)
                .init(device),
        }
    }
}

impl<B: Backend> Discriminator<B> {
    pub fn forward(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        self.activation.forward(self.net.forward(images))
    }
}

impl<B: Backend> Generator<B> {
    pub fn forward(&self, noise: Tensor<B, 2>, code: Tensor<B, 2>) -> Tensor<B, 2> {
        let inputs = Tensor::cat(vec![noise, code], 1);
        self.activation.forward(self.net.forward(inputs))
    }
}

impl<B: Backend> CodePredictor<B> {
    pub fn forward(&self, images: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.net.forward(images), 1)
    }
}

#[cfg(test)]
impl<B: Backend> Discriminator<B> {
    pub(crate) fn snapshot(&self) -> Vec<Vec<f32>> {
        self.net.snapshot()
    }
}

#[cfg(test)]
impl<B: Backend> Generator<B> {
    pub(crate) fn snapshot(&self) -> Vec<Vec<f32>> {
        self.net.snapshot()
    }
}

#[cfg(test)]
impl<B: Backend> CodePredictor<B> {
    pub(crate) fn snapshot(&self) -> Vec<Vec<f32>> {
        self.net.snapshot()
    }
}
