use anyhow::{anyhow, Result};
use candle_core::Tensor;
use candle_nn::{conv2d, linear, Conv2d, Conv2dConfig, Linear, Module, VarBuilder};
use std::fmt;

const KERNEL: usize = 7;
const POOL: usize = 3;
const CHANNELS: [usize; 3] = [32, 64, 128];
const HIDDEN: usize = 64;
const OUTPUTS: usize = 2;

/// Spatial size after one conv(valid) + max-pool stage, `None` once it collapses
fn stage(size: usize) -> Option<usize> {
    let conv = size.checked_sub(KERNEL - 1)?;
    let pooled = conv / POOL;
    (pooled > 0).then_some(pooled)
}

/// Feature-map (height, width) after the three conv blocks
pub fn feature_map(height: usize, width: usize) -> Option<(usize, usize)> {
    let (mut h, mut w) = (height, width);
    for _ in CHANNELS {
        h = stage(h)?;
        w = stage(w)?;
    }
    Some((h, w))
}

/// Three conv/pool blocks followed by a small dense head regressing (theta1, theta2).
pub struct GazeNet {
    conv1: Conv2d,
    conv2: Conv2d,
    conv3: Conv2d,
    fc1: Linear,
    head: Linear,
    input: (usize, usize),
}

impl GazeNet {
    /// `input` is (height, width) of the combined single-channel image
    pub fn new(vb: VarBuilder, input: (usize, usize)) -> Result<Self> {
        let (fh, fw) = feature_map(input.0, input.1)
            .ok_or_else(|| anyhow!("Input {}x{} is too small for the conv stack", input.0, input.1))?;
        let cfg = Conv2dConfig::default();

        let conv1 = conv2d(1, CHANNELS[0], KERNEL, cfg, vb.pp("conv1"))?;
        let conv2 = conv2d(CHANNELS[0], CHANNELS[1], KERNEL, cfg, vb.pp("conv2"))?;
        let conv3 = conv2d(CHANNELS[1], CHANNELS[2], KERNEL, cfg, vb.pp("conv3"))?;
        let fc1 = linear(CHANNELS[2] * fh * fw, HIDDEN, vb.pp("dense"))?;
        let head = linear(HIDDEN, OUTPUTS, vb.pp("gaze-c"))?;

        Ok(Self { conv1, conv2, conv3, fc1, head, input })
    }

    pub fn input_shape(&self) -> (usize, usize) {
        self.input
    }

    pub fn summary(&self) -> ModelSummary {
        let (mut h, mut w) = self.input;
        let mut layers = Vec::new();
        let mut in_c = 1;
        for (i, &out_c) in CHANNELS.iter().enumerate() {
            h -= KERNEL - 1;
            w -= KERNEL - 1;
            layers.push(LayerSummary {
                name: format!("conv2d_{}", i + 1),
                output: vec![h, w, out_c],
                params: KERNEL * KERNEL * in_c * out_c + out_c,
            });
            h /= POOL;
            w /= POOL;
            layers.push(LayerSummary {
                name: format!("max_pooling2d_{}", i + 1),
                output: vec![h, w, out_c],
                params: 0,
            });
            in_c = out_c;
        }
        let flat = h * w * in_c;
        layers.push(LayerSummary { name: "flatten".into(), output: vec![flat], params: 0 });
        layers.push(LayerSummary { name: "dense".into(), output: vec![HIDDEN], params: flat * HIDDEN + HIDDEN });
        layers.push(LayerSummary { name: "gaze-c".into(), output: vec![OUTPUTS], params: HIDDEN * OUTPUTS + OUTPUTS });
        ModelSummary { layers }
    }
}

impl Module for GazeNet {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let xs = self.conv1.forward(xs)?.relu()?.max_pool2d(POOL)?;
        let xs = self.conv2.forward(&xs)?.relu()?.max_pool2d(POOL)?;
        let xs = self.conv3.forward(&xs)?.relu()?.max_pool2d(POOL)?;
        let xs = xs.flatten_from(1)?;
        let xs = self.fc1.forward(&xs)?.relu()?;
        self.head.forward(&xs)
    }
}

#[derive(Debug, Clone)]
pub struct LayerSummary {
    pub name: String,
    pub output: Vec<usize>,
    pub params: usize,
}

#[derive(Debug, Clone)]
pub struct ModelSummary {
    pub layers: Vec<LayerSummary>,
}

impl ModelSummary {
    pub fn total_params(&self) -> usize {
        self.layers.iter().map(|l| l.params).sum()
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<20} | {:<20} | {:>10}", "Layer", "Output Shape", "Params")?;
        writeln!(f, "{}", "-".repeat(56))?;
        for layer in &self.layers {
            let shape = layer
                .output
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "{:<20} | {:<20} | {:>10}", layer.name, format!("(None, {})", shape), layer.params)?;
        }
        writeln!(f, "{}", "-".repeat(56))?;
        write!(f, "Total params: {}", self.total_params())
    }
}
