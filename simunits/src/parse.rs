// simunits/src/parse.rs
//! Hand-rolled parser for unit expressions.
//!
//! Grammar (whitespace or `*` multiply, `/` divides the next factor only):
//! ```text
//! expr     := factor (sep factor)*
//! factor   := number | symbol [('^' | '**') exponent]
//! exponent := ['('] ['-'|'+'] int ['/' int] [')']
//! ```

use std::iter::Peekable;
use std::str::Chars;

use num_traits::One;

use crate::error::UnitsError;
use crate::table;
use crate::unit::{CompositeUnit, Exponent, Unit};

pub(crate) fn parse(expr: &str) -> Result<Unit, UnitsError> {
    let fail = |reason: &'static str| UnitsError::Parse {
        expr: expr.to_string(),
        reason,
    };

    let normalized = expr.trim().replace("**", "^");
    if normalized.is_empty() {
        return Err(fail("empty unit expression"));
    }

    let mut out = CompositeUnit::new(1.0);
    let mut chars = normalized.chars().peekable();
    let mut invert = false;
    let mut factors = 0usize;

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == '*' {
            chars.next();
            continue;
        }
        if c == '/' {
            if invert {
                return Err(fail("two divisions in a row"));
            }
            invert = true;
            chars.next();
            continue;
        }

        if c.is_ascii_digit() || c == '.' || c == '-' || c == '+' {
            let literal = read_number(&mut chars);
            let value: f64 = literal.parse().map_err(|_| fail("malformed numeric prefactor"))?;
            out.scale_by(if invert { value.recip() } else { value });
        } else if c.is_alphabetic() || c == '_' {
            let symbol = read_symbol(&mut chars);
            let def = table::lookup(&symbol).ok_or(UnitsError::UnknownSymbol(symbol))?;
            let mut power = Exponent::one();
            if chars.peek() == Some(&'^') {
                chars.next();
                power = read_exponent(&mut chars).ok_or_else(|| fail("malformed exponent"))?;
            }
            out.push(def, if invert { -power } else { power });
        } else {
            return Err(fail("unexpected character"));
        }

        invert = false;
        factors += 1;
    }

    if invert {
        return Err(fail("dangling division"));
    }
    if factors == 0 {
        return Err(fail("no factors"));
    }
    Ok(Unit::Composite(out))
}

fn read_number(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut s = String::new();
    if let Some(&sign @ ('-' | '+')) = chars.peek() {
        s.push(sign);
        chars.next();
    }
    while let Some(&c) = chars.peek() {
        match c {
            '0'..='9' | '.' => s.push(c),
            'e' | 'E' => {
                s.push(c);
                chars.next();
                if let Some(&sign @ ('-' | '+')) = chars.peek() {
                    s.push(sign);
                } else {
                    continue;
                }
            }
            _ => break,
        }
        chars.next();
    }
    s
}

fn read_symbol(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut s = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            s.push(c);
            chars.next();
        } else {
            break;
        }
    }
    s
}

fn read_int(chars: &mut Peekable<Chars<'_>>) -> Option<i32> {
    let mut s = String::new();
    if let Some(&sign @ ('-' | '+')) = chars.peek() {
        s.push(sign);
        chars.next();
    }
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        s.push(c);
        chars.next();
    }
    s.parse().ok()
}

fn read_exponent(chars: &mut Peekable<Chars<'_>>) -> Option<Exponent> {
    let paren = chars.peek() == Some(&'(');
    if paren {
        chars.next();
    }
    let numer = read_int(chars)?;
    let mut denom = 1;

    // `/` directly followed by a digit belongs to the exponent, otherwise it divides.
    if chars.peek() == Some(&'/') {
        let mut ahead = chars.clone();
        ahead.next();
        if ahead.peek().is_some_and(|c| c.is_ascii_digit()) {
            chars.next();
            denom = read_int(chars)?;
        }
    }
    if paren && chars.next() != Some(')') {
        return None;
    }
    if denom == 0 {
        return None;
    }
    Some(Exponent::new(numer, denom))
}
