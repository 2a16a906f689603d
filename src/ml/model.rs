use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        pool::{MaxPool1d, MaxPool1dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::relu,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct DilatedCnnConfig {
    /// Samples per window (one window per label)
    #[config(default = 16)]
    pub window_len:    usize,
    #[config(default = 2)]
    pub num_classes:   usize,
    #[config(default = 4)]
    pub conv1_filters: usize,
    #[config(default = 8)]
    pub conv1_kernel:  usize,
    #[config(default = 16)]
    pub conv2_filters: usize,
    #[config(default = 4)]
    pub conv2_kernel:  usize,
    #[config(default = 2)]
    pub dilation:      usize,
    #[config(default = 2)]
    pub pool_size:     usize,
    #[config(default = 2)]
    pub pool_stride:   usize,
    #[config(default = 16)]
    pub dense_units:   usize,
    #[config(default = 0.4)]
    pub dropout:       f64,
}

/// (left, right) zero padding that keeps a dilated convolution's output
/// as long as its input. Any odd column goes on the right.
pub fn same_padding(kernel: usize, dilation: usize) -> (usize, usize) {
    let total = kernel.saturating_sub(1) * dilation;
    (total / 2, total - total / 2)
}

/// Output length of a valid (unpadded) pooling window.
pub fn pooled_len(len: usize, pool: usize, stride: usize) -> usize {
    if len < pool || stride == 0 {
        0
    } else {
        (len - pool) / stride + 1
    }
}

impl DilatedCnnConfig {
    /// Length of the sequence after both conv + pool stages.
    pub fn final_len(&self) -> usize {
        let after_first = pooled_len(self.window_len, self.pool_size, self.pool_stride);
        pooled_len(after_first, self.pool_size, self.pool_stride)
    }

    /// Width of the flattened feature vector fed to the dense layer.
    pub fn flattened_len(&self) -> usize {
        self.final_len() * self.conv2_filters
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let sizes = [
            ("window_len", self.window_len),
            ("conv1_filters", self.conv1_filters),
            ("conv1_kernel", self.conv1_kernel),
            ("conv2_filters", self.conv2_filters),
            ("conv2_kernel", self.conv2_kernel),
            ("dilation", self.dilation),
            ("pool_size", self.pool_size),
            ("pool_stride", self.pool_stride),
            ("dense_units", self.dense_units),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, v)| *v == 0) {
            anyhow::bail!("model config: {name} must be positive");
        }
        if self.num_classes < 2 {
            anyhow::bail!("model config: need at least 2 classes, got {}", self.num_classes);
        }
        if !(0.0..1.0).contains(&self.dropout) {
            anyhow::bail!("model config: dropout {} is outside [0, 1)", self.dropout);
        }
        if self.final_len() == 0 {
            anyhow::bail!(
                "model config: a window of {} samples is too short for two pools of {} (stride {})",
                self.window_len, self.pool_size, self.pool_stride
            );
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> DilatedCnn<B> {
        let stage1  = self.build_stage(1, self.conv1_filters, self.conv1_kernel, device);
        let stage2  = self.build_stage(self.conv1_filters, self.conv2_filters, self.conv2_kernel, device);
        let dense   = LinearConfig::new(self.flattened_len(), self.dense_units).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        let logits  = LinearConfig::new(self.dense_units, self.num_classes).init(device);
        DilatedCnn { stage1, stage2, dense, dropout, logits }
    }

    fn build_stage<B: Backend>(
        &self,
        channels_in:  usize,
        channels_out: usize,
        kernel:       usize,
        device:       &B::Device,
    ) -> DilatedConvStage<B> {
        let (left, right) = same_padding(kernel, self.dilation);
        let conv = Conv1dConfig::new(channels_in, channels_out, kernel)
            .with_dilation(self.dilation)
            .with_padding(PaddingConfig1d::Explicit(left))
            .init(device);
        let pool = MaxPool1dConfig::new(self.pool_size)
            .with_stride(self.pool_stride)
            .init();
        DilatedConvStage { conv, pool, trailing_pad: right - left }
    }
}

/// Dilated conv (same padding) → ReLU → max pool.
#[derive(Module, Debug)]
pub struct DilatedConvStage<B: Backend> {
    pub conv:         Conv1d<B>,
    pub pool:         MaxPool1d,
    /// Extra zero column on the right when the same padding is uneven
    pub trailing_pad: usize,
}

impl<B: Backend> DilatedConvStage<B> {
    /// x: [batch, channels, len] → [batch, filters, pooled_len]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = if self.trailing_pad > 0 {
            let [batch, channels, _] = x.dims();
            let zeros = Tensor::zeros([batch, channels, self.trailing_pad], &x.device());
            Tensor::cat(vec![x, zeros], 2)
        } else {
            x
        };
        self.pool.forward(relu(self.conv.forward(x)))
    }
}

#[derive(Module, Debug)]
pub struct DilatedCnn<B: Backend> {
    pub stage1:  DilatedConvStage<B>,
    pub stage2:  DilatedConvStage<B>,
    pub dense:   Linear<B>,
    pub dropout: Dropout,
    pub logits:  Linear<B>,
}

impl<B: Backend> DilatedCnn<B> {
    /// windows: [batch, window_len] → logits: [batch, num_classes]
    ///
    /// Dropout only fires on autodiff backends, i.e. while training;
    /// `model.valid()` turns it off for evaluation and prediction.
    pub fn forward(&self, windows: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, len] = windows.dims();

        // Single input channel
        let x = windows.reshape([batch, 1, len]);
        let x = self.stage1.forward(x);
        let x = self.stage2.forward(x); // [batch, conv2_filters, final_len]

        let x = x.flatten::<2>(1, 2);
        let x = self.dropout.forward(relu(self.dense.forward(x)));
        self.logits.forward(x)
    }
}
