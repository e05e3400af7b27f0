//! Lossless float encoding.
//!
//! Binary formats store every `f32` as is. Human readable formats write finite values as
//! numbers and non-finite ones as strings: `"inf"`, `"-inf"`, or `"nan:0x"` followed by the
//! eight hex digits of the NaN's bits, so every value survives a round trip bit for bit.

use core::fmt;

use serde::{
    de::{self, SeqAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

const INF: &str = "inf";
const NEG_INF: &str = "-inf";
const NAN_PREFIX: &str = "nan:0x";

struct Float(f32);

impl Serialize for Float {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value = self.0;

        if !serializer.is_human_readable() || value.is_finite() {
            serializer.serialize_f32(value)
        } else if value.is_nan() {
            serializer.collect_str(&format_args!("{NAN_PREFIX}{:08x}", value.to_bits()))
        } else if value.is_sign_positive() {
            serializer.serialize_str(INF)
        } else {
            serializer.serialize_str(NEG_INF)
        }
    }
}

impl<'de> Deserialize<'de> for Float {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if !deserializer.is_human_readable() {
            return f32::deserialize(deserializer).map(Float);
        }

        struct FloatVisitor;

        impl<'de> Visitor<'de> for FloatVisitor {
            type Value = Float;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number, \"inf\", \"-inf\" or a \"nan:0x\" bit pattern")
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Float(value as f32))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Float(value as f32))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Float(value as f32))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let invalid = || E::invalid_value(de::Unexpected::Str(value), &self);

                match value {
                    INF => Ok(Float(f32::INFINITY)),
                    NEG_INF => Ok(Float(f32::NEG_INFINITY)),
                    _ => {
                        let bits = value
                            .strip_prefix(NAN_PREFIX)
                            .filter(|digits| digits.len() == 8)
                            .and_then(|digits| u32::from_str_radix(digits, 16).ok())
                            .ok_or_else(invalid)?;
                        let nan = f32::from_bits(bits);

                        if nan.is_nan() {
                            Ok(Float(nan))
                        } else {
                            Err(invalid())
                        }
                    }
                }
            }
        }

        deserializer.deserialize_any(FloatVisitor)
    }
}

struct FloatSeq<'a>(&'a [f32]);

impl Serialize for FloatSeq<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.iter().copied().map(Float))
    }
}

struct FloatVec(Vec<f32>);

impl<'de> Deserialize<'de> for FloatVec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if !deserializer.is_human_readable() {
            return Vec::<f32>::deserialize(deserializer).map(FloatVec);
        }

        struct FloatVecVisitor;

        impl<'de> Visitor<'de> for FloatVecVisitor {
            type Value = FloatVec;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of floats")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut values = Vec::new();
                while let Some(Float(value)) = seq.next_element()? {
                    values.push(value);
                }

                Ok(FloatVec(values))
            }
        }

        deserializer.deserialize_seq(FloatVecVisitor)
    }
}

/// `#[serde(with)]` module for a single `f32`.
pub(super) mod scalar {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        Float(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        Float::deserialize(deserializer).map(|Float(value)| value)
    }
}

/// `#[serde(with)]` module for a sequence of `f32`.
pub(super) mod seq {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        FloatSeq(values).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        FloatVec::deserialize(deserializer).map(|FloatVec(values)| values)
    }
}

/// `#[serde(with)]` module for a sequence of `f32` sequences.
pub(super) mod nested {
    use super::*;

    pub fn serialize<S: Serializer>(
        values: &[Vec<f32>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|values| FloatSeq(values)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<f32>>, D::Error> {
        let values = Vec::<FloatVec>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|FloatVec(values)| values).collect())
    }
}
