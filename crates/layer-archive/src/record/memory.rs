use super::recorder::{bin_config, decode_error, encode_error};
use super::{ArchiveError, Recorder};
use serde::{de::DeserializeOwned, Serialize};

/// Recorder trait specialized to save and load data to and from bytes.
///
/// # Notes
///
/// This is especially useful when an archive travels inside another message rather than a
/// file of its own.
pub trait BytesRecorder:
    Recorder<RecordArgs = (), RecordOutput = Vec<u8>, LoadArgs = Vec<u8>>
{
}

/// In memory recorder using the [bincode format](bincode).
#[derive(new, Debug, Default, Clone)]
pub struct BinBytesRecorder;

impl BytesRecorder for BinBytesRecorder {}

impl Recorder for BinBytesRecorder {
    type RecordArgs = ();
    type RecordOutput = Vec<u8>;
    type LoadArgs = Vec<u8>;

    fn save_item<I: Serialize>(
        &self,
        item: I,
        _args: Self::RecordArgs,
    ) -> Result<Self::RecordOutput, ArchiveError> {
        bincode::serde::encode_to_vec(item, bin_config()).map_err(encode_error)
    }

    fn load_item<I: DeserializeOwned>(&self, args: Self::LoadArgs) -> Result<I, ArchiveError> {
        let (state, read) =
            bincode::serde::decode_from_slice(&args, bin_config()).map_err(decode_error)?;

        if read != args.len() {
            return Err(ArchiveError::schema(format!(
                "{} trailing bytes after the archive",
                args.len() - read
            )));
        }

        Ok(state)
    }
}

/// In memory recorder using the [named msgpack](rmp_serde) format.
#[derive(new, Debug, Default, Clone)]
pub struct NamedMpkBytesRecorder;

impl BytesRecorder for NamedMpkBytesRecorder {}

impl Recorder for NamedMpkBytesRecorder {
    type RecordArgs = ();
    type RecordOutput = Vec<u8>;
    type LoadArgs = Vec<u8>;

    fn save_item<I: Serialize>(
        &self,
        item: I,
        _args: Self::RecordArgs,
    ) -> Result<Self::RecordOutput, ArchiveError> {
        rmp_serde::encode::to_vec_named(&item).map_err(encode_error)
    }

    fn load_item<I: DeserializeOwned>(&self, args: Self::LoadArgs) -> Result<I, ArchiveError> {
        rmp_serde::decode::from_slice(&args).map_err(decode_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{BatchNormalizationConfig, FullyConnectedConfig, Layer, Node};

    #[test]
    fn test_can_save_and_load_bin_format() {
        test_can_save_and_load(BinBytesRecorder)
    }

    #[test]
    fn test_can_save_and_load_mpk_format() {
        test_can_save_and_load(NamedMpkBytesRecorder)
    }

    fn test_can_save_and_load<R: BytesRecorder>(recorder: R) {
        let mut model1 = create_model();
        let model2 = create_model();
        model1[0]
            .layer_mut()
            .params_mut()
            .into_iter()
            .for_each(|param| param.value.fill(0.25));

        let bytes1 = recorder.record(&model1, ()).unwrap();
        let bytes2 = recorder.record(&model2, ()).unwrap();

        let model2_after = recorder.load(bytes1.clone()).unwrap();
        let bytes2_after = recorder.record(&model2_after, ()).unwrap();

        assert_ne!(bytes1, bytes2);
        assert_eq!(bytes1, bytes2_after);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = BinBytesRecorder.record(&create_model(), ()).unwrap();
        bytes.push(0);

        assert!(matches!(
            BinBytesRecorder.load(bytes),
            Err(ArchiveError::Schema(_))
        ));
    }

    pub fn create_model() -> Vec<Node> {
        vec![
            Node::new(Layer::FullyConnected(
                FullyConnectedConfig::new(32, 32).with_bias(true).init().unwrap(),
            )),
            Node::new(Layer::BatchNormalization(
                BatchNormalizationConfig::new(1, 32).init().unwrap(),
            )),
        ]
    }
}
