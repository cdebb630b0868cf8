use anyhow::{Context, bail};
use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::{Dataset, vision::MnistItem};
use burn::prelude::*;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::model::constants::{HEIGHT, IMAGE_DIM, NUM_CLASSES, WIDTH};
use crate::model::sampling::one_hot;

#[derive(Clone, Default)]
pub struct MnistBatcher {}

#[derive(Clone, Debug)]
pub struct MnistBatch<B: Backend> {
    pub images: Tensor<B, 2>, // Shape: [batch_size, 784], intensities in [0, 1]
    pub labels: Tensor<B, 2>, // Shape: [batch_size, 10], one-hot
}

impl<B: Backend> Batcher<B, MnistItem, MnistBatch<B>> for MnistBatcher {
    fn batch(&self, items: Vec<MnistItem>, device: &B::Device) -> MnistBatch<B> {
        let batch_size = items.len();
        let mut pixels = Vec::with_capacity(batch_size * IMAGE_DIM);
        for item in &items {
            for row in item.image.iter() {
                pixels.extend(row.iter().map(|&p| p / 255.0));
            }
        }
        let labels: Vec<usize> = items.iter().map(|item| item.label as usize).collect();

        MnistBatch {
            images: Tensor::from_data(
                TensorData::new(pixels, [batch_size, HEIGHT * WIDTH]).convert::<B::FloatElem>(),
                device,
            ),
            labels: one_hot(&labels, NUM_CLASSES, device),
        }
    }
}

/// Endless minibatch source over a dataset. Items are visited in a shuffled
/// order that is redrawn at every epoch; a batch crossing the end of an epoch
/// is completed from the start of the next one.
pub struct MinibatchSampler<D> {
    dataset: D,
    order: Vec<usize>,
    cursor: usize,
    epochs: usize,
    drawn: usize,
    rng: StdRng,
    batcher: MnistBatcher,
}

impl<D: Dataset<MnistItem>> MinibatchSampler<D> {
    pub fn new(dataset: D, seed: u64) -> anyhow::Result<Self> {
        if dataset.is_empty() {
            bail!("cannot draw minibatches from an empty dataset");
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        order.shuffle(&mut rng);

        Ok(Self {
            dataset,
            order,
            cursor: 0,
            epochs: 0,
            drawn: 0,
            rng,
            batcher: MnistBatcher::default(),
        })
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Completed passes over the dataset.
    pub fn epochs(&self) -> usize {
        self.epochs
    }

    /// Items handed out since construction.
    pub fn drawn(&self) -> usize {
        self.drawn
    }

    fn next_index(&mut self) -> usize {
        if self.cursor == self.order.len() {
            self.order.shuffle(&mut self.rng);
            self.cursor = 0;
            self.epochs += 1;
        }
        let index = self.order[self.cursor];
        self.cursor += 1;
        self.drawn += 1;
        index
    }

    /// Exactly `n` items; a hole in the dataset is an error.
    pub fn next_items(&mut self, n: usize) -> anyhow::Result<Vec<MnistItem>> {
        (0..n)
            .map(|_| {
                let index = self.next_index();
                self.dataset
                    .get(index)
                    .with_context(|| format!("dataset item {index} missing"))
            })
            .collect()
    }

    pub fn next_batch<B: Backend>(
        &mut self,
        n: usize,
        device: &B::Device,
    ) -> anyhow::Result<MnistBatch<B>> {
        let items = self.next_items(n)?;
        Ok(self.batcher.batch(items, device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::data::dataset::InMemDataset;

    type TestBackend = NdArray<f32>;

    /// Items whose pixels all equal their index, labelled `index % 10`.
    fn synthetic_dataset(len: usize) -> InMemDataset<MnistItem> {
        InMemDataset::new(
            (0..len)
                .map(|i| MnistItem {
                    image: [[(i % 256) as f32; WIDTH]; HEIGHT],
                    label: (i % NUM_CLASSES) as u8,
                })
                .collect(),
        )
    }

    #[test]
    fn batcher_flattens_and_normalizes() {
        let device = Default::default();
        let items = synthetic_dataset(3).iter().collect::<Vec<_>>();
        let batch: MnistBatch<TestBackend> = MnistBatcher::default().batch(items, &device);

        assert_eq!(batch.images.dims(), [3, IMAGE_DIM]);
        assert_eq!(batch.labels.dims(), [3, NUM_CLASSES]);
        let pixels = batch.images.into_data().to_vec::<f32>().unwrap();
        assert!(pixels.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert!((pixels[2 * IMAGE_DIM] - 2.0 / 255.0).abs() < 1e-7);
        let labels = batch.labels.into_data().to_vec::<f32>().unwrap();
        assert_eq!(labels[NUM_CLASSES + 1], 1.0);
    }

    #[test]
    fn every_item_is_visited_once_per_epoch() {
        let mut sampler = MinibatchSampler::new(synthetic_dataset(10), 5).unwrap();

        let items = sampler.next_items(10).unwrap();
        let mut seen: Vec<u8> = items.iter().map(|i| i.label).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<u8>>());
        assert_eq!(sampler.epochs(), 0);
        assert_eq!(sampler.drawn(), 10);
    }

    #[test]
    fn batch_straddles_epoch_boundary() {
        let device = Default::default();
        let mut sampler = MinibatchSampler::new(synthetic_dataset(5), 9).unwrap();

        sampler.next_batch::<TestBackend>(3, &device).unwrap();
        let batch = sampler.next_batch::<TestBackend>(3, &device).unwrap();
        assert_eq!(batch.images.dims(), [3, IMAGE_DIM]);
        assert_eq!(sampler.epochs(), 1);
    }

    /// Reports a length of 4 but only holds the even indices.
    struct SparseDataset;

    impl Dataset<MnistItem> for SparseDataset {
        fn get(&self, index: usize) -> Option<MnistItem> {
            (index % 2 == 0).then(|| MnistItem {
                image: [[0.0; WIDTH]; HEIGHT],
                label: 0,
            })
        }

        fn len(&self) -> usize {
            4
        }
    }

    #[test]
    fn missing_item_fails_the_batch() {
        let device = Default::default();
        let mut sampler = MinibatchSampler::new(SparseDataset, 1).unwrap();

        let err = sampler.next_batch::<TestBackend>(4, &device).unwrap_err();
        assert!(err.to_string().contains("missing"), "{err}");
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let empty = InMemDataset::<MnistItem>::new(Vec::new());
        assert!(MinibatchSampler::new(empty, 0).is_err());
    }
}
