// External imports
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::{activation, backend::Backend, Tensor};

/// Gate projections for one direction of an LSTM
#[derive(Module, Debug)]
pub struct GateWeights<B: Backend> {
    // input, forget, cell and output gates combined
    input: Linear<B>,
    hidden: Linear<B>,
}

impl<B: Backend> GateWeights<B> {
    fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        let gate_size = 4 * hidden_size;
        Self {
            input: LinearConfig::new(input_size, gate_size).init(device),
            hidden: LinearConfig::new(hidden_size, gate_size).init(device),
        }
    }
}

/// LSTM layer, optionally bidirectional
#[derive(Module, Debug)]
pub struct Lstm<B: Backend> {
    input_size: usize,
    hidden_size: usize,
    forward_weights: GateWeights<B>,
    reverse_weights: Option<GateWeights<B>>,
}

impl<B: Backend> Lstm<B> {
    /// Create a new LSTM layer
    pub fn new(input_size: usize, hidden_size: usize, bidirectional: bool, device: &B::Device) -> Self {
        Self {
            input_size,
            hidden_size,
            forward_weights: GateWeights::new(input_size, hidden_size, device),
            reverse_weights: bidirectional.then(|| GateWeights::new(input_size, hidden_size, device)),
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn is_bidirectional(&self) -> bool {
        self.reverse_weights.is_some()
    }

    /// Width of each output step: `hidden_size`, doubled when bidirectional
    pub fn output_size(&self) -> usize {
        if self.is_bidirectional() {
            2 * self.hidden_size
        } else {
            self.hidden_size
        }
    }

    /// Run one direction over the sequence.
    ///
    /// Hidden states are returned in input time order even when the
    /// sequence is consumed back to front.
    fn process_direction(&self, x: Tensor<B, 3>, weights: &GateWeights<B>, reverse: bool) -> Tensor<B, 3> {
        let device = x.device();
        let [batch_size, seq_len, _] = x.dims();

        // Initial hidden and cell states (zeros)
        let mut h = Tensor::<B, 2>::zeros([batch_size, self.hidden_size], &device);
        let mut c = Tensor::<B, 2>::zeros([batch_size, self.hidden_size], &device);
        let mut outputs = Vec::with_capacity(seq_len);

        for t in 0..seq_len {
            let time_idx = if reverse { seq_len - 1 - t } else { t };
            let x_t = x
                .clone()
                .narrow(1, time_idx, 1)
                .reshape([batch_size, self.input_size]);

            let gates = weights.input.forward(x_t) + weights.hidden.forward(h);
            let gates = gates.reshape([batch_size, 4, self.hidden_size]);
            let gate = |idx: usize| {
                gates
                    .clone()
                    .narrow(1, idx, 1)
                    .reshape([batch_size, self.hidden_size])
            };

            let i = activation::sigmoid(gate(0));
            let f = activation::sigmoid(gate(1));
            let g = activation::tanh(gate(2));
            let o = activation::sigmoid(gate(3));

            c = f * c + i * g;
            h = o * activation::tanh(c.clone());
            outputs.push(h.clone());
        }

        if reverse {
            outputs.reverse();
        }

        // [batch_size, seq_len, hidden_size]
        Tensor::stack(outputs, 1)
    }

    /// Forward pass returning every time step: `[batch, seq_len, output_size]`
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let forward_output = self.process_direction(x.clone(), &self.forward_weights, false);

        match &self.reverse_weights {
            Some(reverse_weights) => {
                let reverse_output = self.process_direction(x, reverse_weights, true);
                Tensor::cat(vec![forward_output, reverse_output], 2)
            }
            None => forward_output,
        }
    }

    /// Hidden state after the last time step: `[batch, output_size]`
    pub fn forward_last(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let outputs = self.forward(x);
        let [batch_size, seq_len, width] = outputs.dims();
        outputs
            .narrow(1, seq_len - 1, 1)
            .reshape([batch_size, width])
    }
}
