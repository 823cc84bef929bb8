use std::ops::Range;

use rand::Rng;

/// A flattened weight tensor: row-major f32 data plus its logical shape.
/// Read-only input to the pipeline; nothing downstream mutates it.
#[derive(PartialEq, Debug, Clone)]
pub struct Tensor {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
}

impl Tensor {
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Self {
        assert_eq!(
            data.len(),
            shape.iter().product::<usize>(),
            "data length must equal the product of the shape dims"
        );
        Self { data, shape }
    }

    pub fn element_count(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size of the unquantized representation in bytes (4 bytes per element).
    pub fn byte_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    pub fn random(shape: &[usize], range: Range<f32>) -> Self {
        let size = shape.iter().product();
        let mut data = Vec::<f32>::with_capacity(size);

        let mut rng = rand::rng();

        for _ in 0..size {
            data.push(rng.random_range(range.clone()));
        }

        Tensor {
            data,
            shape: shape.to_vec(),
        }
    }
}
