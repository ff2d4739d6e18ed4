//! The numeric capability interface used by root extraction, plus the
//! [`f64`] and [`BigRational`] backends.

use core::{
    convert::TryFrom,
    fmt::{
        Debug,
        Display,
    },
    ops::{
        Neg,
        Sub,
        AddAssign,
        MulAssign,
    },
};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{
    Zero,
    One,
    Signed,
};

use crate::{
    Error,
    Result,
};

/// Largest power-of-ten exponent accepted when parsing a literal into
/// [`Decimal`](crate::Decimal) or [`BigRational`].
pub const MAX_DECIMAL_EXPONENT: u64 = 100_000;

/// Arithmetic needed by Bernoulli's method and by deflation.
///
/// The root extractor never touches a concrete number type directly; it
/// only uses the operations listed here, so the arbitrary-precision backend
/// can be chosen by the caller. Implementations are provided for
/// [`Decimal`](crate::Decimal) (the default), [`BigRational`] and [`f64`].
///
/// Values are created from decimal strings rather than from binary floats,
/// so that no binary rounding error enters before the backend's own
/// precision applies.
///
/// ```
/// # use bernoulli_roots::*;
/// let x = Decimal120::parse_decimal("2.5").unwrap();
/// let y = Decimal120::parse_decimal("-0.125").unwrap();
/// assert_eq!(x.checked_div(&y).unwrap().to_fixed(2), "-20.00");
/// assert_eq!(y.round_places(2).to_fixed(3), "-0.130");
/// assert!(x.checked_div(&Decimal120::parse_decimal("0").unwrap()).is_none());
/// ```
pub trait Real: Clone + Debug + Display + PartialOrd + Zero + One
    + Neg<Output=Self> + Sub<Output=Self>
    + for<'a> AddAssign<&'a Self> + for<'a> MulAssign<&'a Self>
{
    /// Parses a decimal literal such as `-6.0`, `.5` or `1e-42`.
    fn parse_decimal(s: &str) -> Result<Self>;

    /// Divides, returning `None` when `rhs` is zero.
    fn checked_div(&self, rhs: &Self) -> Option<Self>;

    /// Absolute value.
    fn abs(&self) -> Self;

    /// Returns 10<sup>`exp`</sup>.
    fn pow10(exp: i32) -> Self;

    /// Precision clamp: rounds to `places` digits after the decimal point,
    /// half away from zero.
    fn round_places(&self, places: u32) -> Self;

    /// Renders with exactly `places` digits after the decimal point.
    fn to_fixed(&self, places: u32) -> String;
}

impl Real for f64 {
    fn parse_decimal(s: &str) -> Result<Self> {
        match s.trim().parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(x),
            _ => Err(Error::Parse { input: s.to_owned() }),
        }
    }

    #[inline]
    fn checked_div(&self, rhs: &Self) -> Option<Self> {
        if *rhs == 0. {
            None
        } else {
            Some(self / rhs)
        }
    }

    #[inline(always)]
    fn abs(&self) -> Self {
        f64::abs(*self)
    }

    #[inline(always)]
    fn pow10(exp: i32) -> Self {
        10f64.powi(exp)
    }

    /// Values whose scaled form overflows have no digits at that many
    /// places and are returned unchanged.
    fn round_places(&self, places: u32) -> Self {
        let scale = 10f64.powi(i32::try_from(places).unwrap_or(i32::MAX));
        let scaled = self * scale;
        if scaled.is_finite() {
            scaled.round() / scale
        } else {
            *self
        }
    }

    fn to_fixed(&self, places: u32) -> String {
        format!("{:.*}", places as usize, self)
    }
}

impl Real for BigRational {
    fn parse_decimal(s: &str) -> Result<Self> {
        let (mantissa, exp) = parse_bounded(s)?;
        let scale = ten_to(exp.unsigned_abs());
        Ok(if exp >= 0 {
            BigRational::from_integer(mantissa * scale)
        } else {
            BigRational::new(mantissa, scale)
        })
    }

    #[inline]
    fn checked_div(&self, rhs: &Self) -> Option<Self> {
        if rhs.is_zero() {
            None
        } else {
            Some(self / rhs)
        }
    }

    #[inline(always)]
    fn abs(&self) -> Self {
        Signed::abs(self)
    }

    fn pow10(exp: i32) -> Self {
        let scale = ten_to(exp.unsigned_abs());
        if exp >= 0 {
            BigRational::from_integer(scale)
        } else {
            BigRational::new(BigInt::one(), scale)
        }
    }

    fn round_places(&self, places: u32) -> Self {
        BigRational::new(scaled_round(self, places), ten_to(places))
    }

    fn to_fixed(&self, places: u32) -> String {
        format_fixed(&scaled_round(self, places), places)
    }
}

/// Rounds `x * 10^places` to the nearest integer.
fn scaled_round(x: &BigRational, places: u32) -> BigInt {
    (x * BigRational::from_integer(ten_to(places))).round().to_integer()
}

/// Splits a decimal literal into an integer mantissa `m` and exponent `e`
/// with value `m * 10^e`.
pub(crate) fn parse_scientific(input: &str) -> Result<(BigInt, i64)> {
    let err = || Error::Parse { input: input.to_owned() };
    let s = input.trim();
    let (body, exp) = match s.find(|c| c == 'e' || c == 'E') {
        Some(i) => (&s[..i], s[i+1..].parse::<i64>().map_err(|_| err())?),
        None => (s, 0),
    };
    let (negative, body) = match body.as_bytes().first() {
        Some(b'-') => (true, &body[1..]),
        Some(b'+') => (false, &body[1..]),
        _ => (false, body),
    };
    let (int, frac) = match body.find('.') {
        Some(i) => (&body[..i], &body[i+1..]),
        None => (body, ""),
    };
    if (int.is_empty() && frac.is_empty())
        || !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit())
    {
        return Err(err());
    }
    let digits: String = int.chars().chain(frac.chars()).collect();
    let magnitude = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(err)?;
    let exp = exp.checked_sub(frac.len() as i64).ok_or_else(err)?;
    Ok((if negative { -magnitude } else { magnitude }, exp))
}

/// [`parse_scientific`], rejecting exponents beyond [`MAX_DECIMAL_EXPONENT`].
pub(crate) fn parse_bounded(input: &str) -> Result<(BigInt, i64)> {
    let (mantissa, exp) = parse_scientific(input)?;
    match exp.unsigned_abs() {
        bound if bound <= MAX_DECIMAL_EXPONENT => Ok((mantissa, exp)),
        _ => Err(Error::Parse { input: input.to_owned() }),
    }
}

#[inline]
pub(crate) fn ten_to<E: Into<u64>>(exp: E) -> BigInt {
    let exp = usize::try_from(exp.into()).unwrap_or(usize::MAX);
    num_traits::pow(BigInt::from(10u8), exp)
}

/// Formats the integer `scaled / 10^places` with exactly `places`
/// fractional digits.
pub(crate) fn format_fixed<T: Display>(scaled: &T, places: u32) -> String {
    let text = scaled.to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", text.as_str()),
    };
    let places = usize::try_from(places).unwrap_or(usize::MAX);
    if places == 0 {
        return format!("{}{}", sign, digits);
    }
    let padded = format!("{:0>width$}", digits, width = places + 1);
    let (int, frac) = padded.split_at(padded.len() - places);
    format!("{}{}.{}", sign, int, frac)
}
