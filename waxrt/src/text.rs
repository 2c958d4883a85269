//! Byte string helpers
//!
//! Strings in the languages this runtime serves are plain byte strings. The
//! helpers here copy, join and cut them with fallible allocation, and render
//! numbers into a small inline buffer the way C's `printf` would, so output
//! is identical whichever target language a program was compiled to.

use crate::mem;
use crate::Error;
use arrayvec::ArrayString;
use std::fmt::Write;

/// Inline string for number rendering
///
/// Holds any `%d` rendering of an `i32` and any `%g` rendering of an `f32`.
pub type ShortStr = ArrayString<32>;

/// Significant digits in a `%g` rendering
const GENERAL_PRECISION: i32 = 6;

/// Render an integer in decimal.
pub fn int_to_short(x: i32) -> ShortStr {
    let mut out = ShortStr::new();
    write!(out, "{}", x).expect("an i32 always fits in a short string");
    out
}

/// Render a float like C's `%g`.
///
/// Uses 6 significant digits and strips trailing zeros. Exponents below -4
/// or at least 6 switch to scientific notation with a signed exponent of at
/// least two digits, as in `1.5e+06`. Infinities render as `inf` or `-inf`
/// and NaN as `nan`.
pub fn float_to_short(x: f32) -> ShortStr {
    let mut out = ShortStr::new();
    write_general(&mut out, f64::from(x)).expect("a %g rendering always fits in a short string");
    out
}

/// Write `x` in `%g` notation.
fn write_general<W: Write>(out: &mut W, x: f64) -> std::fmt::Result {
    if x.is_nan() {
        return out.write_str("nan");
    }
    if x.is_infinite() {
        return out.write_str(if x < 0.0 { "-inf" } else { "inf" });
    }

    // The decimal exponent after rounding to the target precision decides
    // between fixed and scientific form.
    let sci = format!("{:.*e}", (GENERAL_PRECISION - 1) as usize, x);
    let (mantissa, exponent) = sci.split_once('e').ok_or(std::fmt::Error)?;
    let exponent: i32 = exponent.parse().map_err(|_| std::fmt::Error)?;

    if exponent < -4 || exponent >= GENERAL_PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        write!(
            out,
            "{}e{}{:02}",
            strip_zeros(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (GENERAL_PRECISION - 1 - exponent) as usize;
        out.write_str(strip_zeros(&format!("{:.*}", decimals, x)))
    }
}

/// Remove trailing zeros after a decimal point, and the point itself if
/// nothing is left after it.
fn strip_zeros(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

/// Copy a byte string into new storage.
pub fn duplicate(s: &[u8]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    concat(&mut out, s)?;
    Ok(out)
}

/// Append `tail` to `s`.
pub fn concat(s: &mut Vec<u8>, tail: &[u8]) -> Result<(), Error> {
    s.try_reserve_exact(tail.len())
        .map_err(|_| Error::allocation(s.len().saturating_add(tail.len()), 1))?;
    s.extend_from_slice(tail);
    Ok(())
}

/// Append one character, given as an integer code.
///
/// Only the low byte of `code` is stored, as with a C `char` conversion.
pub fn push_code(s: &mut Vec<u8>, code: i32) -> Result<(), Error> {
    concat(s, &[code as u8])
}

/// Copy `count` bytes of `s` starting at `index`.
///
/// Returns [`Error::OutOfRange`] if the range doesn't fit inside `s`.
pub fn substr(s: &[u8], index: usize, count: usize) -> Result<Vec<u8>, Error> {
    let part = index
        .checked_add(count)
        .and_then(|end| s.get(index..end))
        .ok_or_else(|| Error::out_of_range(index, count, s.len()))?;
    Ok(mem::try_copy(part)?.into_vec())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_stripping() {
        assert_eq!(strip_zeros("1.50000"), "1.5");
        assert_eq!(strip_zeros("2.00000"), "2");
        assert_eq!(strip_zeros("100000"), "100000");
        assert_eq!(strip_zeros("-0.00000"), "-0");
    }
}
