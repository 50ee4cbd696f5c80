use crate::{layers::Layer, Error, Result, Tensor};

/// Ordered stack of layers, the spine a ResNet-style classifier is built
/// on. Layers run in insertion order; each consumes the previous output.
#[derive(Debug)]
pub struct Stack {
    name: String,
    layers: Vec<Box<dyn Layer>>,
    input_shape: Option<Vec<usize>>,
}

impl Stack {
    pub fn new(name: String) -> Self {
        Self {
            name,
            layers: Vec::new(),
            input_shape: None,
        }
    }

    pub fn add(&mut self, layer: Box<dyn Layer>) {
        self.layers.push(layer);
    }

    pub fn set_input_shape(&mut self, shape: Vec<usize>) {
        self.input_shape = Some(shape);
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    pub fn predict(&self, input: &Tensor) -> Result<Tensor> {
        if self.layers.is_empty() {
            return Err(Error::Model(
                "Cannot predict with an empty stack".to_string(),
            ));
        }

        let mut current = input.clone();

        for (idx, layer) in self.layers.iter().enumerate() {
            current = layer
                .forward(&current)
                .map_err(|e| Error::Layer(format!("Layer {} ({}): {}", idx, layer.name(), e)))?;
        }

        Ok(current)
    }

    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        self.layers
            .iter()
            .try_fold(input_shape.to_vec(), |shape, layer| {
                layer.output_shape(&shape)
            })
    }

    /// One line per layer with the shape flowing out of it, when an input
    /// shape has been set:
    ///
    /// ```text
    /// resnet (2 layers)
    ///   input [4, 4, 1]
    ///    0: block1                -> [4, 4, 1]
    ///    1: block2                -> [2, 2, 2]
    /// ```
    pub fn summary(&self) -> String {
        let mut s = format!("{} ({} layers)\n", self.name, self.layers.len());

        let mut shape = self.input_shape.clone().unwrap_or_default();
        if !shape.is_empty() {
            s.push_str(&format!("  input {:?}\n", shape));
        }

        for (idx, layer) in self.layers.iter().enumerate() {
            if shape.is_empty() {
                s.push_str(&format!("  {:2}: {}\n", idx, layer.name()));
            } else {
                shape = layer.output_shape(&shape).unwrap_or_default();
                s.push_str(&format!("  {:2}: {:20} -> {:?}\n", idx, layer.name(), shape));
            }
        }

        s
    }
}
