use core::fmt;

use serde::{
    de::{MapAccess, SeqAccess, Visitor},
    ser::{self, SerializeMap, SerializeSeq},
    Deserialize, Deserializer, Serialize, Serializer,
};

use super::connection::{self, ConnectionTableRecord};
use super::narrow::{to_serial, to_serial_shape, to_size, to_size_shape, SerialShape, SerialSize};
use super::ArchiveError;
use crate::nn::{ConnectionTable, NetPhase, NormRegion, Padding, Shape3d, SliceType};

/// Type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// A size, stored as [SerialSize].
    Size,
    /// A 3D shape.
    Shape,
    /// A float scalar.
    Float,
    /// A boolean.
    Bool,
    /// A [padding](Padding) mode.
    Padding,
    /// A [phase](NetPhase).
    Phase,
    /// A [slice axis](SliceType).
    SliceType,
    /// A [normalization region](NormRegion).
    NormRegion,
    /// A [connection table](ConnectionTable).
    ConnectionTable,
    /// A sequence of 3D shapes.
    Shapes,
    /// A sequence of floats.
    Floats,
}

/// A field value as held by a live layer.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum FieldValue {
    Size(usize),
    Shape(Shape3d),
    Float(f32),
    Bool(bool),
    Padding(Padding),
    Phase(NetPhase),
    SliceType(SliceType),
    NormRegion(NormRegion),
    ConnectionTable(ConnectionTable),
    Shapes(Vec<Shape3d>),
    Floats(Vec<f32>),
}

/// A field value as stored in an archive: sizes are narrowed and connection tables encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ArchiveValue {
    Size(SerialSize),
    Shape(SerialShape),
    Float(#[serde(with = "super::float::scalar")] f32),
    Bool(bool),
    Padding(Padding),
    Phase(NetPhase),
    SliceType(SliceType),
    NormRegion(NormRegion),
    ConnectionTable(ConnectionTableRecord),
    Shapes(Vec<SerialShape>),
    Floats(#[serde(with = "super::float::seq")] Vec<f32>),
}

impl FieldValue {
    /// The type of the value.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Size(_) => FieldType::Size,
            FieldValue::Shape(_) => FieldType::Shape,
            FieldValue::Float(_) => FieldType::Float,
            FieldValue::Bool(_) => FieldType::Bool,
            FieldValue::Padding(_) => FieldType::Padding,
            FieldValue::Phase(_) => FieldType::Phase,
            FieldValue::SliceType(_) => FieldType::SliceType,
            FieldValue::NormRegion(_) => FieldType::NormRegion,
            FieldValue::ConnectionTable(_) => FieldType::ConnectionTable,
            FieldValue::Shapes(_) => FieldType::Shapes,
            FieldValue::Floats(_) => FieldType::Floats,
        }
    }

    /// Convert to the archived form, narrowing every size.
    pub fn into_archive(self) -> Result<ArchiveValue, ArchiveError> {
        Ok(match self {
            FieldValue::Size(size) => ArchiveValue::Size(to_serial(size)?),
            FieldValue::Shape(shape) => ArchiveValue::Shape(to_serial_shape(&shape)?),
            FieldValue::Float(value) => ArchiveValue::Float(value),
            FieldValue::Bool(value) => ArchiveValue::Bool(value),
            FieldValue::Padding(value) => ArchiveValue::Padding(value),
            FieldValue::Phase(value) => ArchiveValue::Phase(value),
            FieldValue::SliceType(value) => ArchiveValue::SliceType(value),
            FieldValue::NormRegion(value) => ArchiveValue::NormRegion(value),
            FieldValue::ConnectionTable(table) => {
                ArchiveValue::ConnectionTable(connection::encode(&table)?)
            }
            FieldValue::Shapes(shapes) => ArchiveValue::Shapes(
                shapes
                    .iter()
                    .map(to_serial_shape)
                    .collect::<Result<_, _>>()?,
            ),
            FieldValue::Floats(values) => ArchiveValue::Floats(values),
        })
    }
}

impl ArchiveValue {
    /// The type of the value.
    pub fn field_type(&self) -> FieldType {
        match self {
            ArchiveValue::Size(_) => FieldType::Size,
            ArchiveValue::Shape(_) => FieldType::Shape,
            ArchiveValue::Float(_) => FieldType::Float,
            ArchiveValue::Bool(_) => FieldType::Bool,
            ArchiveValue::Padding(_) => FieldType::Padding,
            ArchiveValue::Phase(_) => FieldType::Phase,
            ArchiveValue::SliceType(_) => FieldType::SliceType,
            ArchiveValue::NormRegion(_) => FieldType::NormRegion,
            ArchiveValue::ConnectionTable(_) => FieldType::ConnectionTable,
            ArchiveValue::Shapes(_) => FieldType::Shapes,
            ArchiveValue::Floats(_) => FieldType::Floats,
        }
    }

    /// Convert to the native form. Widening never fails; decoding a connection table can.
    pub fn into_native(self) -> Result<FieldValue, ArchiveError> {
        Ok(match self {
            ArchiveValue::Size(size) => FieldValue::Size(to_size(size)),
            ArchiveValue::Shape(shape) => FieldValue::Shape(to_size_shape(&shape)),
            ArchiveValue::Float(value) => FieldValue::Float(value),
            ArchiveValue::Bool(value) => FieldValue::Bool(value),
            ArchiveValue::Padding(value) => FieldValue::Padding(value),
            ArchiveValue::Phase(value) => FieldValue::Phase(value),
            ArchiveValue::SliceType(value) => FieldValue::SliceType(value),
            ArchiveValue::NormRegion(value) => FieldValue::NormRegion(value),
            ArchiveValue::ConnectionTable(record) => {
                FieldValue::ConnectionTable(connection::decode(record)?)
            }
            ArchiveValue::Shapes(shapes) => {
                FieldValue::Shapes(shapes.iter().map(to_size_shape).collect())
            }
            ArchiveValue::Floats(values) => FieldValue::Floats(values),
        })
    }
}

/// One archived field. Binary archives omit the name.
#[derive(new, Debug, Clone, PartialEq)]
pub struct ArchiveField {
    /// The field name, when the archive format carries names.
    pub name: Option<String>,
    /// The value.
    pub value: ArchiveValue,
}

/// The kind-specific fields of one node, in schema order.
///
/// Human readable formats write an ordered `name -> value` map; binary formats write the
/// values positionally.
#[derive(new, Debug, Clone, PartialEq, Default)]
pub struct Fields(pub Vec<ArchiveField>);

impl Serialize for Fields {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            let mut map = serializer.serialize_map(Some(self.0.len()))?;
            for field in &self.0 {
                let name = field
                    .name
                    .as_deref()
                    .ok_or_else(|| ser::Error::custom("a named archive requires field names"))?;
                map.serialize_entry(name, &field.value)?;
            }
            map.end()
        } else {
            let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
            for field in &self.0 {
                seq.serialize_element(&field.value)?;
            }
            seq.end()
        }
    }
}

/// Preallocation for a sequence whose length comes from the archive itself.
pub(super) fn cautious_capacity(size_hint: Option<usize>) -> usize {
    size_hint.unwrap_or(0).min(MAX_PREALLOCATED)
}

const MAX_PREALLOCATED: usize = 64;

impl<'de> Deserialize<'de> for Fields {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = Fields;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an ordered list of layer fields")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields = Vec::with_capacity(cautious_capacity(map.size_hint()));
                while let Some((name, value)) = map.next_entry::<String, ArchiveValue>()? {
                    fields.push(ArchiveField::new(Some(name), value));
                }

                Ok(Fields(fields))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut fields = Vec::with_capacity(cautious_capacity(seq.size_hint()));
                while let Some(value) = seq.next_element::<ArchiveValue>()? {
                    fields.push(ArchiveField::new(None, value));
                }

                Ok(Fields(fields))
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_map(FieldsVisitor)
        } else {
            deserializer.deserialize_seq(FieldsVisitor)
        }
    }
}
