pub const HEIGHT: usize = 28;
pub const WIDTH: usize = 28;
pub const IMAGE_DIM: usize = HEIGHT * WIDTH;

/// Number of digit classes, also the size of the InfoGAN categorical code.
pub const NUM_CLASSES: usize = 10;

pub const ALI_LATENT_DIM: usize = 64;
pub const ALI_HIDDEN_DIM: usize = 128;

pub const INFOGAN_NOISE_DIM: usize = 16;
pub const INFOGAN_CODE_DIM: usize = NUM_CLASSES;
pub const INFOGAN_GENERATOR_HIDDEN_DIM: usize = 256;
pub const INFOGAN_HIDDEN_DIM: usize = 128;

/// Added inside every logarithm of a probability.
pub const LOG_EPSILON: f32 = 1e-8;
