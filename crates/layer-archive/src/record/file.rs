use super::recorder::{bin_config, decode_error, encode_error};
use super::{ArchiveError, Recorder};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Recorder trait specialized to save and load data to and from files.
pub trait FileRecorder:
    Recorder<RecordArgs = PathBuf, RecordOutput = (), LoadArgs = PathBuf>
{
    /// File extension of the format used by the recorder.
    fn file_extension() -> &'static str;
}

/// File recorder using the [bincode format](bincode).
#[derive(new, Debug, Default, Clone)]
pub struct BinFileRecorder;

/// File recorder using the [bincode format](bincode) compressed with gzip.
#[derive(new, Debug, Default, Clone)]
pub struct BinGzFileRecorder;

/// File recorder using the json format compressed with gzip.
#[derive(new, Debug, Default, Clone)]
pub struct JsonGzFileRecorder;

/// File recorder using pretty json for easy readability.
#[derive(new, Debug, Default, Clone)]
pub struct PrettyJsonFileRecorder;

/// File recorder using the [named msgpack](rmp_serde) format compressed with gzip.
#[derive(new, Debug, Default, Clone)]
pub struct NamedMpkGzFileRecorder;

impl FileRecorder for BinGzFileRecorder {
    fn file_extension() -> &'static str {
        "bin.gz"
    }
}
impl FileRecorder for BinFileRecorder {
    fn file_extension() -> &'static str {
        "bin"
    }
}
impl FileRecorder for JsonGzFileRecorder {
    fn file_extension() -> &'static str {
        "json.gz"
    }
}
impl FileRecorder for PrettyJsonFileRecorder {
    fn file_extension() -> &'static str {
        "json"
    }
}

impl FileRecorder for NamedMpkGzFileRecorder {
    fn file_extension() -> &'static str {
        "mpk.gz"
    }
}

/// Open the archive at `file`, with the recorder's extension.
fn open<R: FileRecorder>(file: &mut PathBuf) -> Result<BufReader<File>, ArchiveError> {
    file.set_extension(R::file_extension());

    File::open(file.as_path())
        .map(BufReader::new)
        .map_err(|err| io_error(file, err))
}

/// Create the archive at `file`, with the recorder's extension, replacing any existing one.
fn create<R: FileRecorder>(file: &mut PathBuf) -> Result<BufWriter<File>, ArchiveError> {
    file.set_extension(R::file_extension());

    if file.exists() {
        log::info!("File exists, replacing {}", file.display());
        std::fs::remove_file(file.as_path()).map_err(|err| io_error(file, err))?;
    }

    File::create(file.as_path())
        .map(BufWriter::new)
        .map_err(|err| io_error(file, err))
}

fn io_error(file: &Path, err: std::io::Error) -> ArchiveError {
    match err.kind() {
        std::io::ErrorKind::NotFound => {
            ArchiveError::FileNotFound(format!("{}: {err}", file.display()))
        }
        _ => ArchiveError::Io(format!("{}: {err}", file.display())),
    }
}

/// Run `encode` against a gzip stream over `writer`, then flush everything.
fn gzipped<W: Write>(
    writer: W,
    encode: impl FnOnce(&mut GzEncoder<W>) -> Result<(), ArchiveError>,
) -> Result<W, ArchiveError> {
    let mut writer = GzEncoder::new(writer, Compression::default());
    encode(&mut writer)?;

    writer.finish().map_err(encode_error)
}

fn json_decode_error(err: serde_json::Error) -> ArchiveError {
    if err.is_io() {
        ArchiveError::Io(err.to_string())
    } else {
        decode_error(err)
    }
}

macro_rules! file_recorder {
    ($recorder:ident, |$item:ident, $writer:ident| $save:expr, |$reader:ident| $load:expr) => {
        impl Recorder for $recorder {
            type RecordArgs = PathBuf;
            type RecordOutput = ();
            type LoadArgs = PathBuf;

            fn save_item<I: Serialize>(
                &self,
                $item: I,
                mut file: Self::RecordArgs,
            ) -> Result<(), ArchiveError> {
                let mut $writer = create::<Self>(&mut file)?;
                $save?;

                $writer.flush().map_err(|err| io_error(&file, err))
            }

            fn load_item<I: DeserializeOwned>(
                &self,
                mut file: Self::LoadArgs,
            ) -> Result<I, ArchiveError> {
                let $reader = open::<Self>(&mut file)?;

                $load
            }
        }
    };
}

file_recorder!(
    BinFileRecorder,
    |item, writer| bincode::serde::encode_into_std_write(&item, &mut writer, bin_config())
        .map_err(encode_error),
    |reader| bincode::serde::decode_from_std_read(&mut { reader }, bin_config())
        .map_err(decode_error)
);

file_recorder!(
    BinGzFileRecorder,
    |item, writer| gzipped(&mut writer, |gz| {
        bincode::serde::encode_into_std_write(&item, gz, bin_config())
            .map(drop)
            .map_err(encode_error)
    }),
    |reader| bincode::serde::decode_from_std_read(&mut GzDecoder::new(reader), bin_config())
        .map_err(decode_error)
);

file_recorder!(
    JsonGzFileRecorder,
    |item, writer| gzipped(&mut writer, |gz| {
        serde_json::to_writer(gz, &item).map_err(encode_error)
    }),
    |reader| serde_json::from_reader(GzDecoder::new(reader)).map_err(json_decode_error)
);

file_recorder!(
    PrettyJsonFileRecorder,
    |item, writer| serde_json::to_writer_pretty(&mut writer, &item).map_err(encode_error),
    |reader| serde_json::from_reader(reader).map_err(json_decode_error)
);

file_recorder!(
    NamedMpkGzFileRecorder,
    |item, writer| gzipped(&mut writer, |gz| {
        rmp_serde::encode::write_named(gz, &item).map_err(encode_error)
    }),
    |reader| rmp_serde::decode::from_read(GzDecoder::new(reader)).map_err(decode_error)
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{ConvolutionConfig, FullyConnectedConfig, Layer, Node, PoolingConfig, Shape3d};
    use tempfile::TempDir;

    fn graph() -> Vec<Node> {
        vec![
            Node::new(Layer::Convolutional(
                ConvolutionConfig::new(Shape3d::new(8, 8, 1), [3, 3], 2)
                    .init()
                    .unwrap(),
            )),
            Node::new(Layer::AveragePooling(
                PoolingConfig::new(Shape3d::new(6, 6, 2), [2, 2], [2, 2])
                    .init_average()
                    .unwrap(),
            )),
            Node::new(Layer::FullyConnected(
                FullyConnectedConfig::new(18, 4).init().unwrap(),
            )),
        ]
    }

    fn initialized(nodes: Vec<Node>) -> Vec<Node> {
        nodes
            .into_iter()
            .map(|mut node| {
                node.mark_initialized();
                node
            })
            .collect()
    }

    #[test]
    fn test_can_save_and_load_jsongz_format() {
        test_can_save_and_load(JsonGzFileRecorder)
    }

    #[test]
    fn test_can_save_and_load_bin_format() {
        test_can_save_and_load(BinFileRecorder)
    }

    #[test]
    fn test_can_save_and_load_bingz_format() {
        test_can_save_and_load(BinGzFileRecorder)
    }

    #[test]
    fn test_can_save_and_load_pretty_json_format() {
        test_can_save_and_load(PrettyJsonFileRecorder)
    }

    #[test]
    fn test_can_save_and_load_mpkgz_format() {
        test_can_save_and_load(NamedMpkGzFileRecorder)
    }

    fn test_can_save_and_load<R: FileRecorder>(recorder: R) {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("graph");

        recorder.record(&graph(), file.clone()).unwrap();
        let nodes = recorder.load(file.clone()).unwrap();

        assert!(file.with_extension(R::file_extension()).exists());
        assert_eq!(nodes, initialized(graph()));
    }

    #[test]
    fn saving_replaces_an_existing_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("graph");
        let recorder = PrettyJsonFileRecorder;

        recorder.record(&graph(), file.clone()).unwrap();
        recorder.record(&graph()[2..], file.clone()).unwrap();

        assert_eq!(recorder.load(file).unwrap().len(), 1);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = TempDir::new().unwrap();

        let result = BinFileRecorder.load(dir.path().join("missing"));

        assert!(matches!(result, Err(ArchiveError::FileNotFound(_))));
    }

    #[test]
    fn truncated_file_is_a_schema_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("graph");
        BinFileRecorder.record(&graph(), file.clone()).unwrap();

        let path = file.with_extension(BinFileRecorder::file_extension());
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(matches!(
            BinFileRecorder.load(file),
            Err(ArchiveError::Schema(_))
        ));
    }
}
