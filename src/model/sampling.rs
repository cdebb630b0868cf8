use burn::prelude::*;
use rand::Rng;

/// `[m, n]` batch drawn uniformly from [-1, 1].
pub fn sample_uniform<B: Backend, R: Rng>(
    rng: &mut R,
    m: usize,
    n: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let values: Vec<f32> = (0..m * n).map(|_| rng.random_range(-1.0..=1.0)).collect();
    Tensor::from_data(TensorData::new(values, [m, n]).convert::<B::FloatElem>(), device)
}

/// `[m, classes]` batch of one-hot rows, each class drawn independently and
/// uniformly.
pub fn sample_code<B: Backend, R: Rng>(
    rng: &mut R,
    m: usize,
    classes: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let labels: Vec<usize> = (0..m).map(|_| rng.random_range(0..classes)).collect();
    one_hot(&labels, classes, device)
}

/// `[m, classes]` batch where every row selects `class`.
pub fn fixed_code<B: Backend>(
    class: usize,
    m: usize,
    classes: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    one_hot(&vec![class; m], classes, device)
}

pub fn one_hot<B: Backend>(labels: &[usize], classes: usize, device: &B::Device) -> Tensor<B, 2> {
    let mut values = vec![0.0f32; labels.len() * classes];
    for (row, &label) in labels.iter().enumerate() {
        values[row * classes + label] = 1.0;
    }
    Tensor::from_data(
        TensorData::new(values, [labels.len(), classes]).convert::<B::FloatElem>(),
        device,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use rand::{SeedableRng, rngs::StdRng};

    type TestBackend = NdArray<f32>;

    #[test]
    fn uniform_samples_stay_in_range() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(1);
        let z = sample_uniform::<TestBackend, _>(&mut rng, 32, 64, &device);

        assert_eq!(z.dims(), [32, 64]);
        let values = z.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|&v| (-1.0..=1.0).contains(&v)));
        assert!(values.iter().any(|&v| v < 0.0) && values.iter().any(|&v| v > 0.0));
    }

    #[test]
    fn code_rows_have_a_single_one() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(2);
        let c = sample_code::<TestBackend, _>(&mut rng, 32, 10, &device);

        assert_eq!(c.dims(), [32, 10]);
        let values = c.into_data().to_vec::<f32>().unwrap();
        for row in values.chunks(10) {
            assert_eq!(row.iter().filter(|&&v| v == 1.0).count(), 1);
            assert_eq!(row.iter().filter(|&&v| v == 0.0).count(), 9);
        }
    }

    #[test]
    fn code_classes_are_uniform() {
        let device = Default::default();
        let mut rng = StdRng::seed_from_u64(3);
        let draws = 10_000;
        let c = sample_code::<TestBackend, _>(&mut rng, draws, 10, &device);

        let counts = c.sum_dim(0).into_data().to_vec::<f32>().unwrap();
        for count in counts {
            let freq = count / draws as f32;
            assert!((freq - 0.1).abs() < 0.02, "class frequency {freq}");
        }
    }

    #[test]
    fn fixed_code_repeats_one_class() {
        let device = Default::default();
        let c = fixed_code::<TestBackend>(4, 5, 10, &device);

        let values = c.into_data().to_vec::<f32>().unwrap();
        for row in values.chunks(10) {
            assert_eq!(row[4], 1.0);
            assert_eq!(row.iter().sum::<f32>(), 1.0);
        }
    }
}
