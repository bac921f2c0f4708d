//! IBM System/360 hexadecimal floating point.
//!
//! Transport files store every numeric value as an 8-byte IBM double:
//! one sign bit, a 7-bit base-16 exponent biased by 64, and a 56-bit
//! fraction in `[1/16, 1)`.

/// Standard missing value (`.`).
pub const MISSING: [u8; 8] = [0x2e, 0, 0, 0, 0, 0, 0, 0];

const FRACTION_BITS: i32 = 56;
const EXPONENT_BIAS: i32 = 64;

/// Convert an IEEE double to IBM format.
///
/// Non-finite values encode as [`MISSING`]. Magnitudes below the IBM
/// range flush to zero and magnitudes above it saturate.
pub fn ieee_to_ibm(value: f64) -> [u8; 8] {
    if !value.is_finite() {
        return MISSING;
    }
    if value == 0.0 {
        return [0; 8];
    }

    let sign = if value.is_sign_negative() { 0x80u8 } else { 0 };
    let (mantissa, exp2) = frexp(value.abs());

    // value = mantissa * 2^exp2 = fraction * 16^exp16 with fraction in [1/16, 1)
    let mut exp16 = (exp2 + 3).div_euclid(4);
    let fraction = mantissa * 2f64.powi(exp2 - 4 * exp16);
    let mut bits = (fraction * 2f64.powi(FRACTION_BITS)).round() as u64;
    if bits >= 1u64 << FRACTION_BITS {
        bits >>= 4;
        exp16 += 1;
    }

    let biased = exp16 + EXPONENT_BIAS;
    if biased < 0 {
        return [0; 8];
    }
    if biased > 0x7f {
        return [sign | 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
    }

    let mut out = [0u8; 8];
    out[0] = sign | biased as u8;
    out[1..].copy_from_slice(&bits.to_be_bytes()[1..]);
    out
}

/// Split a positive finite `value` into `mantissa * 2^exp` with the
/// mantissa in `[0.5, 1)`.
fn frexp(value: f64) -> (f64, i32) {
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32;
    if exponent == 0 {
        // Subnormal
        let (mantissa, exp) = frexp(value * 2f64.powi(64));
        return (mantissa, exp - 64);
    }
    let mantissa = f64::from_bits((bits & !(0x7ff << 52)) | (1022 << 52));
    (mantissa, exponent - 1022)
}
