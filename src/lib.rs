// src/lib.rs
/*!
`simarray`: unit-tracked numeric arrays for simulation data.

A [`SimArray`] is a strided numeric array that carries
- an optional physical unit ([`Unit`]), reconciled automatically by arithmetic,
  comparisons and reductions;
- a weak link to an owning [`SimContext`], used for contextual unit conversions
  (scale factor `a`, Hubble `h`) and for dirty notification of in-place writes;
- an optional particle [`Family`] and a name inside the context.

```
use simarray::{NumericContainer, SimArray};

let x = SimArray::from_vec(vec![1.0f64, 2.0]).with_units("Mpc").unwrap();
let y = SimArray::from_vec(vec![1.0f64, 2.0]).with_units("kpc").unwrap();
let z = x.checked_add(&y).unwrap();
assert_eq!(z.units().to_string(), "Mpc");
assert!((z.get(&[0]).unwrap() - 1.001).abs() < 1e-12);
```

Modules:
- [`array`]: the array type, indexed views, arithmetic and reductions;
- [`context`]: the owning-context interface and the weak handle arrays hold;
- [`ufunc`]: the per-operation unit rule registry;
- [`math`]: element types, layouts and storage.
*/

pub mod array;
pub mod context;
pub mod error;
pub mod math;
pub mod ufunc;

pub use array::{
    array_factory, BoolArray, CmpOp, FactoryOptions, IndexSpec, IndexedView, NumericContainer, SimArray,
};
pub use context::{ContextHandle, Family, SimContext};
pub use error::{ArrayError, Result};
pub use math::{IntScalar, Layout, Scalar, SliceRange};
pub use ufunc::{register_rule, resolve_units, Number, Operand, UnitRule};

pub use simunits;
pub use simunits::{ConversionContext, IntoUnit, Unit, UnitsError};
