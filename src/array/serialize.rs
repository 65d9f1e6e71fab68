// src/array/serialize.rs
//! Serde support: `{ "shape": [...], "data": [...], "units": "kpc" | null }`.
//!
//! Only values and the unit tag travel. A deserialized array has no name and no
//! context; the receiving side re-binds it if needed.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use simunits::Unit;

use super::SimArray;
use crate::math::Scalar;

fn no_unit() -> Unit {
    Unit::NoUnit
}

#[derive(Serialize)]
struct ArrayOut<'a, T> {
    shape: &'a [usize],
    data: Vec<T>,
    units: Unit,
}

#[derive(Deserialize)]
struct ArrayIn<T> {
    shape: Vec<usize>,
    data: Vec<T>,
    #[serde(default = "no_unit")]
    units: Unit,
}

impl<T: Scalar + Serialize> Serialize for SimArray<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ArrayOut {
            shape: self.shape(),
            data: self.to_vec(),
            units: self.units(),
        }
        .serialize(serializer)
    }
}

impl<'de, T: Scalar + Deserialize<'de>> Deserialize<'de> for SimArray<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = ArrayIn::<T>::deserialize(deserializer)?;
        let out = SimArray::new(raw.data, raw.shape).map_err(D::Error::custom)?;
        out.set_units_opt(Some(raw.units));
        Ok(out)
    }
}
