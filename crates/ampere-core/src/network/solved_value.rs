//! Serde representation of solved values.
//!
//! JSON has no infinity or NaN, and a shorted or open network produces both.
//! Finite values are written as numbers; non-finite ones as the strings
//! `"inf"`, `"-inf"` and `"nan"`. Reading accepts the same forms plus `null`
//! (read as NaN).

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;

const INF: &str = "inf";
const NEG_INF: &str = "-inf";
const NAN: &str = "nan";

pub(crate) fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str(NAN)
    } else if value.is_sign_positive() {
        serializer.serialize_str(INF)
    } else {
        serializer.serialize_str(NEG_INF)
    }
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    deserializer.deserialize_any(SolvedValueVisitor)
}

struct SolvedValueVisitor;

impl Visitor<'_> for SolvedValueVisitor {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a number, \"{}\", \"{}\", \"{}\" or null", INF, NEG_INF, NAN)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        match v {
            INF => Ok(f64::INFINITY),
            NEG_INF => Ok(f64::NEG_INFINITY),
            NAN => Ok(f64::NAN),
            other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
        Ok(f64::NAN)
    }

    fn visit_none<E: de::Error>(self) -> Result<f64, E> {
        Ok(f64::NAN)
    }
}
