mod common;

use layer_archive::nn::*;
use layer_archive::record::{
    load_graph, load_node, save_graph, save_node, ArchiveError, ArchiveValue, BinBytesRecorder,
    BinFileRecorder, Connection, FileRecorder, NamedMpkBytesRecorder, Recorder,
};
use rstest::rstest;
use tempfile::TempDir;

#[test]
fn truncating_any_record_fails() {
    for node in common::every_kind_graph() {
        let record = save_node(&node).unwrap();

        for end in 0..record.fields.0.len() {
            let mut truncated = record.clone();
            truncated.fields.0.truncate(end);

            assert!(
                matches!(load_node(truncated), Err(ArchiveError::Schema(_))),
                "{} truncated after {end} fields loaded",
                node.kind()
            );
        }
    }
}

#[test]
fn truncating_a_binary_archive_fails() {
    let graph = vec![common::with_weights(Layer::Convolutional(
        ConvolutionConfig::new(Shape3d::new(4, 4, 2), [2, 2], 3)
            .with_table(common::sparse_table())
            .init()
            .unwrap(),
    ))];
    let bytes = BinBytesRecorder.record(&graph, ()).unwrap();

    for end in 0..bytes.len() {
        assert!(
            matches!(
                BinBytesRecorder.load(bytes[..end].to_vec()),
                Err(ArchiveError::Schema(_))
            ),
            "archive cut at {end} bytes loaded"
        );
    }
}

#[test]
fn huge_declared_field_count_fails_in_bincode() {
    let mut bytes = Vec::new();
    bytes.extend(1u64.to_le_bytes());
    bytes.extend(0u64.to_le_bytes());
    bytes.extend(4u64.to_le_bytes());
    bytes.extend(b"relu");
    bytes.extend((u64::MAX / 2).to_le_bytes());

    assert!(matches!(
        BinBytesRecorder.load(bytes),
        Err(ArchiveError::Schema(_))
    ));
}

#[test]
fn huge_declared_field_count_fails_in_msgpack() {
    let mut bytes = vec![0x81, 0xa5];
    bytes.extend(b"nodes");
    bytes.extend([0x91, 0x83, 0xa7]);
    bytes.extend(b"weights");
    bytes.extend([0x90, 0xa4]);
    bytes.extend(b"kind");
    bytes.push(0xa4);
    bytes.extend(b"relu");
    bytes.push(0xa6);
    bytes.extend(b"fields");
    bytes.extend([0xdd, 0xff, 0xff, 0xff, 0xff]);

    assert!(matches!(
        NamedMpkBytesRecorder.load(bytes),
        Err(ArchiveError::Schema(_))
    ));
}

#[test]
fn missing_named_field_fails() {
    let graph = vec![Node::new(Layer::Dropout(
        DropoutConfig::new(10, 0.5).init().unwrap(),
    ))];
    let json = serde_json::to_string(&save_graph(&graph).unwrap()).unwrap();
    let json = json.replace(r#""dropout_rate":{"float":0.5},"#, "");

    let result = load_graph(serde_json::from_str(&json).unwrap());

    assert!(matches!(result, Err(ArchiveError::Schema(_))));
}

#[test]
fn reordered_named_fields_fail() {
    let json = r#"{"nodes":[{"weights":[],"kind":"linear","fields":
        {"scale":{"float":2.0},"in_size":{"size":10},"bias":{"float":0.0}}}]}"#;

    let result = load_graph(serde_json::from_str(json).unwrap());

    assert!(matches!(result, Err(ArchiveError::Schema(_))));
}

#[test]
fn mistyped_field_fails() {
    let json = r#"{"nodes":[{"weights":[],"kind":"input","fields":
        {"shape":{"size":10}}}]}"#;

    let result = load_graph(serde_json::from_str(json).unwrap());

    assert!(matches!(result, Err(ArchiveError::Schema(_))));
}

#[test]
fn unknown_kind_fails_the_whole_load() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("graph");
    let graph = common::every_kind_graph();
    let mut record = save_graph(&graph).unwrap();
    record.nodes[3].kind = "depthwise_convolutional".to_string();
    BinFileRecorder.save_item(record, file.clone()).unwrap();

    let result = BinFileRecorder.load(file);

    assert_eq!(
        result,
        Err(ArchiveError::UnknownKind("depthwise_convolutional".to_string()))
    );
}

#[test]
fn dense_table_of_the_wrong_length_fails() {
    let graph = vec![Node::new(Layer::Convolutional(
        ConvolutionConfig::new(Shape3d::new(4, 4, 2), [2, 2], 3)
            .with_table(common::sparse_table())
            .init()
            .unwrap(),
    ))];
    let mut record = save_graph(&graph).unwrap();
    for field in &mut record.nodes[0].fields.0 {
        if let ArchiveValue::ConnectionTable(table) = &mut field.value {
            table.connection = Connection::Dense(vec![true; 5]);
        }
    }

    assert!(matches!(load_graph(record), Err(ArchiveError::Schema(_))));
}

#[test]
fn table_of_the_wrong_dimensions_fails_construction() {
    let graph = vec![Node::new(Layer::Convolutional(
        ConvolutionConfig::new(Shape3d::new(4, 4, 2), [2, 2], 3)
            .init()
            .unwrap(),
    ))];
    let mut record = save_graph(&graph).unwrap();
    for field in &mut record.nodes[0].fields.0 {
        if let ArchiveValue::ConnectionTable(table) = &mut field.value {
            table.rows = 3;
        }
    }

    assert!(matches!(
        load_graph(record),
        Err(ArchiveError::Construction(_))
    ));
}

#[test]
fn huge_full_table_fails_construction() {
    let graph = vec![Node::new(Layer::Convolutional(
        ConvolutionConfig::new(Shape3d::new(4, 4, 1), [3, 3], 1)
            .init()
            .unwrap(),
    ))];
    let mut json = serde_json::to_string(&save_graph(&graph).unwrap()).unwrap();
    let table = r#"{"rows":1,"cols":1,"connection":"all"}"#;
    assert!(json.contains(table));
    json = json.replace(
        table,
        r#"{"rows":4294967295,"cols":4294967295,"connection":"all"}"#,
    );

    let result = load_graph(serde_json::from_str(&json).unwrap());

    assert!(matches!(result, Err(ArchiveError::Construction(_))));
}

#[test]
fn unallocatable_parameters_fail_construction() {
    let graph = vec![Node::new(Layer::FullyConnected(
        FullyConnectedConfig::new(3, 2).init().unwrap(),
    ))];
    let mut record = save_graph(&graph).unwrap();
    for field in &mut record.nodes[0].fields.0 {
        if let ArchiveValue::Size(size) = &mut field.value {
            *size = u32::MAX;
        }
    }

    assert!(matches!(
        load_graph(record),
        Err(ArchiveError::Construction(ConstructionError {
            layer: "fully connected",
            ..
        }))
    ));
}

#[rstest]
#[case::missing_bias(vec![vec![0.0; 6]])]
#[case::short_weight(vec![vec![0.0; 5], vec![0.0; 2]])]
#[case::extra_tensor(vec![vec![0.0; 6], vec![0.0; 2], vec![0.0]])]
fn weight_mismatch_fails(#[case] weights: Vec<Vec<f32>>) {
    let node = Node::new(Layer::FullyConnected(
        FullyConnectedConfig::new(3, 2).init().unwrap(),
    ));
    let mut record = save_node(&node).unwrap();
    record.weights = weights;

    assert!(matches!(load_node(record), Err(ArchiveError::Schema(_))));
}

#[test]
#[cfg(target_pointer_width = "64")]
fn oversized_sizes_fail_the_save() {
    let too_big = u32::MAX as usize + 1;
    let graph = vec![
        Node::new(Layer::Input(InputConfig::new(Shape3d::new(28, 28, 1)).init())),
        Node::new(Layer::Linear(LinearConfig::new(too_big).init())),
    ];

    assert_eq!(save_graph(&graph), Err(ArchiveError::Range(too_big)));
}

#[test]
#[cfg(target_pointer_width = "64")]
fn failed_saves_write_nothing() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("graph");
    let graph = vec![Node::new(Layer::Input(
        InputConfig::new(Shape3d::new(1, u32::MAX as usize + 1, 1)).init(),
    ))];

    let result = BinFileRecorder.record(&graph, file.clone());

    assert!(matches!(result, Err(ArchiveError::Range(_))));
    assert!(!file.with_extension(BinFileRecorder::file_extension()).exists());
}

#[test]
fn sizes_at_the_archive_maximum_are_kept() {
    let graph = vec![Node::new(Layer::ElementwiseAdd(
        ElementwiseAddConfig::new(2, u32::MAX as usize).init().unwrap(),
    ))];

    let loaded = load_graph(save_graph(&graph).unwrap()).unwrap();

    let Layer::ElementwiseAdd(layer) = loaded[0].layer() else {
        panic!("expected an elementwise add layer");
    };
    assert_eq!(layer.config().dim, u32::MAX as usize);
}

#[test]
fn construction_errors_propagate() {
    let mut record = save_graph(&[Node::new(Layer::Dropout(
        DropoutConfig::new(10, 0.5).init().unwrap(),
    ))])
    .unwrap();
    record.nodes[0].fields.0[1].value = ArchiveValue::Float(1.5);

    assert!(matches!(
        load_graph(record),
        Err(ArchiveError::Construction(ConstructionError { layer: "dropout", .. }))
    ));
}
