use burn::{
    module::Param,
    nn::{Linear, Relu},
    prelude::*,
    tensor::Distribution,
};

/// Two dense layers with a ReLU in between. The output is left unsquashed so
/// each network picks its own output activation.
#[derive(Module, Debug)]
pub struct Perceptron<B: Backend> {
    hidden: Linear<B>,
    output: Linear<B>,
    activation: Relu,
}

#[derive(Config, Debug)]
pub struct PerceptronConfig {
    pub d_input: usize,
    pub d_hidden: usize,
    pub d_output: usize,
}

impl PerceptronConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Perceptron<B> {
        Perceptron {
            hidden: dense(self.d_input, self.d_hidden, device),
            output: dense(self.d_hidden, self.d_output, device),
            activation: Relu::new(),
        }
    }
}

impl<B: Backend> Perceptron<B> {
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.hidden.forward(input);
        let x = self.activation.forward(x);
        self.output.forward(x)
    }

    /// Every parameter value, weights before biases, layer by layer.
    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Vec<Vec<f32>> {
        [&self.hidden, &self.output]
            .into_iter()
            .flat_map(|layer| {
                let mut tensors = vec![layer.weight.val().into_data().to_vec::<f32>().unwrap()];
                if let Some(bias) = &layer.bias {
                    tensors.push(bias.val().into_data().to_vec::<f32>().unwrap());
                }
                tensors
            })
            .collect()
    }
}

/// Dense layer with a fan-in scaled normal weight, `std = 1 / sqrt(fan_in / 2)`,
/// and a zero bias.
pub fn dense<B: Backend>(fan_in: usize, fan_out: usize, device: &B::Device) -> Linear<B> {
    let std = 1.0 / (fan_in as f64 / 2.0).sqrt();
    let weight = Tensor::<B, 2>::random([fan_in, fan_out], Distribution::Normal(0.0, std), device);
    let bias = Tensor::<B, 1>::zeros([fan_out], device);

    Linear {
        weight: Param::from_tensor(weight),
        bias: Some(Param::from_tensor(bias)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn dense_layer_has_zero_bias_and_scaled_weights() {
        let device = Default::default();
        TestBackend::seed(7);
        let layer = dense::<TestBackend>(784, 128, &device);

        assert_eq!(layer.weight.val().dims(), [784, 128]);
        let bias = layer.bias.unwrap().val().into_data().to_vec::<f32>().unwrap();
        assert!(bias.iter().all(|&b| b == 0.0));

        let weights = layer.weight.val().into_data().to_vec::<f32>().unwrap();
        let n = weights.len() as f32;
        let mean = weights.iter().sum::<f32>() / n;
        let var = weights.iter().map(|w| (w - mean).powi(2)).sum::<f32>() / n;
        let expected = 2.0 / 784.0;
        assert!(mean.abs() < 1e-2, "mean {mean}");
        assert!((var - expected).abs() < expected * 0.1, "variance {var}");
    }

    #[test]
    fn perceptron_maps_batch_rows() {
        let device = Default::default();
        let net = PerceptronConfig::new(26, 256, 784).init::<TestBackend>(&device);

        for batch in [1, 2, 32] {
            let out = net.forward(Tensor::zeros([batch, 26], &device));
            assert_eq!(out.dims(), [batch, 784]);
        }
    }
}
