// simunits/src/table.rs
/*!
Symbol table of the named units understood by the parser.

Every named unit is defined by a scale relative to the **irreducible** units and
the integer exponents of those irreducibles. Two irreducibles are *contextual*:

- `a`: cosmological scale factor
- `h`: dimensionless Hubble parameter

They behave like ordinary dimensions until a conversion ratio is requested with a
conversion context that supplies their numeric value (see [`crate::Unit::ratio`]).
*/

// ============================================================================
// ----------------------------- Definitions ----------------------------------
// ============================================================================

/// One named unit: `symbol = scale * Π irreducible^power`.
#[derive(Debug)]
pub struct Definition {
    pub symbol: &'static str,
    pub scale: f64,
    pub dims: &'static [(&'static str, i32)],
}

impl PartialEq for Definition {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

const PC: f64 = 3.085_677_581_491_367e16;
const YR: f64 = 3.155_76e7;

static DEFINITIONS: &[Definition] = &[
    // irreducible
    Definition { symbol: "m", scale: 1.0, dims: &[("m", 1)] },
    Definition { symbol: "s", scale: 1.0, dims: &[("s", 1)] },
    Definition { symbol: "kg", scale: 1.0, dims: &[("kg", 1)] },
    Definition { symbol: "K", scale: 1.0, dims: &[("K", 1)] },
    Definition { symbol: "a", scale: 1.0, dims: &[("a", 1)] },
    Definition { symbol: "h", scale: 1.0, dims: &[("h", 1)] },
    // length
    Definition { symbol: "cm", scale: 1e-2, dims: &[("m", 1)] },
    Definition { symbol: "km", scale: 1e3, dims: &[("m", 1)] },
    Definition { symbol: "au", scale: 1.495_978_707e11, dims: &[("m", 1)] },
    Definition { symbol: "pc", scale: PC, dims: &[("m", 1)] },
    Definition { symbol: "kpc", scale: PC * 1e3, dims: &[("m", 1)] },
    Definition { symbol: "Mpc", scale: PC * 1e6, dims: &[("m", 1)] },
    // time
    Definition { symbol: "yr", scale: YR, dims: &[("s", 1)] },
    Definition { symbol: "Myr", scale: YR * 1e6, dims: &[("s", 1)] },
    Definition { symbol: "Gyr", scale: YR * 1e9, dims: &[("s", 1)] },
    // mass
    Definition { symbol: "g", scale: 1e-3, dims: &[("kg", 1)] },
    Definition { symbol: "Msol", scale: 1.988_47e30, dims: &[("kg", 1)] },
    Definition { symbol: "m_p", scale: 1.672_621_923_69e-27, dims: &[("kg", 1)] },
    // energy and constants
    Definition { symbol: "J", scale: 1.0, dims: &[("kg", 1), ("m", 2), ("s", -2)] },
    Definition { symbol: "erg", scale: 1e-7, dims: &[("kg", 1), ("m", 2), ("s", -2)] },
    Definition { symbol: "G", scale: 6.674_30e-11, dims: &[("m", 3), ("kg", -1), ("s", -2)] },
    Definition { symbol: "k", scale: 1.380_649e-23, dims: &[("kg", 1), ("m", 2), ("s", -2), ("K", -1)] },
];

/// Look up a named unit by its exact symbol.
#[inline]
pub fn lookup(symbol: &str) -> Option<&'static Definition> {
    DEFINITIONS.iter().find(|d| d.symbol == symbol)
}

