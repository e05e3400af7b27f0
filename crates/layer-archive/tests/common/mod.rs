#![allow(dead_code)]

use layer_archive::nn::*;

/// A sparse 2x3 table: input 0 feeds outputs 0 and 2, input 1 feeds output 1.
pub fn sparse_table() -> ConnectionTable {
    ConnectionTable::from_fn(2, 3, |row, col| (row + col) % 2 == 0)
}

/// One layer of every kind, configured away from the defaults where possible.
pub fn every_kind() -> Vec<Layer> {
    let activation = || ActivationConfig::new(Shape3d::new(3, 2, 1)).init();

    let mut batch_norm = BatchNormalizationConfig::new(9, 3)
        .with_epsilon(1e-3)
        .with_momentum(0.9)
        .with_phase(NetPhase::Test)
        .init()
        .unwrap();
    batch_norm.set_mean(vec![0.1, 0.2, 0.3]).unwrap();
    batch_norm.set_variance(vec![1.5, 2.5, 3.5]).unwrap();

    vec![
        Layer::FullyConnected(FullyConnectedConfig::new(6, 3).init().unwrap()),
        Layer::Convolutional(
            ConvolutionConfig::new(Shape3d::new(8, 8, 2), [3, 2], 3)
                .with_table(sparse_table())
                .with_padding(Padding::Same)
                .with_stride([2, 1])
                .init()
                .unwrap(),
        ),
        Layer::Deconvolutional(
            ConvolutionConfig::new(Shape3d::new(4, 4, 1), [2, 2], 2)
                .with_stride([2, 2])
                .init_deconvolution()
                .unwrap(),
        ),
        Layer::MaxPooling(
            PoolingConfig::new(Shape3d::new(8, 8, 3), [2, 2], [2, 2])
                .init_max()
                .unwrap(),
        ),
        Layer::AveragePooling(
            PoolingConfig::new(Shape3d::new(7, 5, 2), [3, 2], [2, 1])
                .with_padding(Padding::Same)
                .init_average()
                .unwrap(),
        ),
        Layer::MaxUnpooling(
            UnpoolingConfig::new(Shape3d::new(4, 4, 2), 2, 2)
                .init_max()
                .unwrap(),
        ),
        Layer::AverageUnpooling(
            UnpoolingConfig::new(Shape3d::new(3, 3, 1), 3, 1)
                .init_average()
                .unwrap(),
        ),
        Layer::GlobalAveragePooling(
            GlobalAveragePoolingConfig::new(Shape3d::new(5, 5, 4)).init(),
        ),
        Layer::BatchNormalization(batch_norm),
        Layer::ElementwiseAdd(ElementwiseAddConfig::new(3, 12).init().unwrap()),
        Layer::Concat(
            ConcatConfig::new(vec![Shape3d::new(4, 4, 1), Shape3d::new(2, 8, 3)])
                .init()
                .unwrap(),
        ),
        Layer::Slice(
            SliceConfig::new(Shape3d::new(4, 4, 5), SliceType::SliceChannels, 2)
                .init()
                .unwrap(),
        ),
        Layer::Dropout(
            DropoutConfig::new(20, 0.25)
                .with_phase(NetPhase::Test)
                .init()
                .unwrap(),
        ),
        Layer::Input(InputConfig::new(Shape3d::new(28, 28, 1)).init()),
        Layer::Linear(LinearConfig::new(10).with_scale(2.0).with_bias(-0.5).init()),
        Layer::Lrn(
            LrnConfig::new(Shape3d::new(6, 6, 4), 3)
                .with_alpha(1e-4)
                .with_beta(0.75)
                .with_region(NormRegion::WithinChannels)
                .init()
                .unwrap(),
        ),
        Layer::Power(
            PowerConfig::new(Shape3d::new(2, 2, 2), 2.0)
                .with_scale(0.5)
                .init(),
        ),
        Layer::QuantizedConvolutional(
            ConvolutionConfig::new(Shape3d::new(6, 6, 1), [3, 3], 2)
                .with_bias(false)
                .init()
                .unwrap(),
        ),
        Layer::QuantizedDeconvolutional(
            ConvolutionConfig::new(Shape3d::new(3, 3, 2), [2, 2], 1)
                .with_padding(Padding::Same)
                .init_deconvolution()
                .unwrap(),
        ),
        Layer::QuantizedFullyConnected(
            FullyConnectedConfig::new(4, 2)
                .with_bias(false)
                .init()
                .unwrap(),
        ),
        Layer::Sigmoid(activation()),
        Layer::Tanh(activation()),
        Layer::Relu(activation()),
        Layer::Softmax(activation()),
        Layer::LeakyRelu(
            LeakyReluConfig::new(Shape3d::new(3, 3, 1))
                .with_epsilon(0.2)
                .init(),
        ),
        Layer::Elu(activation()),
        Layer::TanhP1m2(activation()),
        Layer::Softplus(
            SoftplusConfig::new(Shape3d::new(3, 3, 1))
                .with_beta(2.0)
                .with_threshold(10.0)
                .init(),
        ),
        Layer::Softsign(activation()),
    ]
}

/// Fill every parameter with distinct, non-trivial values.
pub fn with_weights(mut layer: Layer) -> Node {
    for (role, param) in layer.params_mut().into_iter().enumerate() {
        for (i, value) in param.value.iter_mut().enumerate() {
            *value = (i as f32 + 1.0) * 0.125 - role as f32 * 3.0;
        }
    }

    Node::new(layer)
}

/// A graph holding one node of every kind.
pub fn every_kind_graph() -> Vec<Node> {
    every_kind().into_iter().map(with_weights).collect()
}
