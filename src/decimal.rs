//! Arbitrary-precision decimal floating point backed by [`dashu_float::DBig`].

use core::{
    cmp::Ordering,
    convert::TryFrom,
    fmt,
    ops::{
        Add,
        Sub,
        Mul,
        Neg,
        AddAssign,
        SubAssign,
        MulAssign,
    },
    str::FromStr,
};
use dashu_float::DBig;
use dashu_int::IBig;
use num_traits::{
    Zero,
    One,
};

use crate::{
    real::{
        self,
        Real,
    },
    Error,
    Result,
};

/// A base-10 float carrying a `DIGITS`-digit precision context.
///
/// Every arithmetic result is rounded half away from zero to `DIGITS`
/// significant decimal digits, so long recurrences keep a fixed relative
/// precision while magnitudes grow or shrink freely.
///
/// ```
/// # use bernoulli_roots::*;
/// # use num_traits::One;
/// let a: Decimal120 = "0.1".parse().unwrap();
/// let b: Decimal120 = "0.2".parse().unwrap();
/// assert_eq!(a + b, "0.3".parse::<Decimal120>().unwrap());
///
/// let third = Decimal::<10>::one().checked_div(&"3".parse().unwrap()).unwrap();
/// assert_eq!(third.to_fixed(12), "0.333333333300");
/// ```
#[derive(Debug, Clone)]
pub struct Decimal<const DIGITS: usize>(DBig);

/// The default high-precision type: 120 significant digits.
pub type Decimal120 = Decimal<120>;

impl<const DIGITS: usize> Decimal<DIGITS> {
    /// Builds `significand * 10^exponent`, rounded to `DIGITS` significant digits.
    pub fn from_parts(significand: IBig, exponent: isize) -> Self {
        Self::from(DBig::from_parts(significand, exponent))
    }

    /// The underlying [`DBig`].
    #[inline(always)]
    pub fn as_dbig(&self) -> &DBig {
        &self.0
    }

    /// `self * 10^places` rounded to the nearest integer, ties away from zero.
    fn scaled_round(&self, places: u32) -> DBig {
        (&self.0 * &ten_to(places)).round()
    }
}

impl<const DIGITS: usize> From<DBig> for Decimal<DIGITS> {
    #[inline]
    fn from(x: DBig) -> Self {
        Self(x.with_precision(DIGITS).value())
    }
}

#[inline]
fn ten_to(places: u32) -> DBig {
    let exponent = isize::try_from(places).unwrap_or(isize::MAX);
    DBig::from_parts(IBig::ONE, exponent)
}

impl<const DIGITS: usize> Zero for Decimal<DIGITS> {
    #[inline(always)]
    fn zero() -> Self {
        Self::from(DBig::ZERO)
    }

    #[inline(always)]
    fn is_zero(&self) -> bool {
        self.0.repr().significand().is_zero()
    }
}

impl<const DIGITS: usize> One for Decimal<DIGITS> {
    #[inline(always)]
    fn one() -> Self {
        Self::from(DBig::ONE)
    }
}

impl<const DIGITS: usize> PartialEq for Decimal<DIGITS> {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<const DIGITS: usize> Eq for Decimal<DIGITS> { }

impl<const DIGITS: usize> Ord for Decimal<DIGITS> {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<const DIGITS: usize> PartialOrd for Decimal<DIGITS> {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const DIGITS: usize> Neg for Decimal<DIGITS> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl<'a, const DIGITS: usize> Neg for &'a Decimal<DIGITS> {
    type Output = Decimal<DIGITS>;

    #[inline]
    fn neg(self) -> Decimal<DIGITS> {
        Decimal(-self.0.clone())
    }
}

// operands always carry the DIGITS context, which dashu propagates to the result
macro_rules! forward_binop {
    ($Op:ident, $op:ident, $OpAssign:ident, $op_assign:ident) => {
        impl<const DIGITS: usize> $Op for Decimal<DIGITS> {
            type Output = Self;

            #[inline]
            fn $op(self, rhs: Self) -> Self {
                Decimal($Op::$op(self.0, rhs.0))
            }
        }

        impl<'a, 'b, const DIGITS: usize> $Op<&'b Decimal<DIGITS>> for &'a Decimal<DIGITS> {
            type Output = Decimal<DIGITS>;

            #[inline]
            fn $op(self, rhs: &'b Decimal<DIGITS>) -> Decimal<DIGITS> {
                Decimal($Op::$op(&self.0, &rhs.0))
            }
        }

        impl<'a, const DIGITS: usize> $OpAssign<&'a Decimal<DIGITS>> for Decimal<DIGITS> {
            #[inline]
            fn $op_assign(&mut self, rhs: &'a Decimal<DIGITS>) {
                self.0 = $Op::$op(&self.0, &rhs.0);
            }
        }
    };
}

forward_binop!(Add, add, AddAssign, add_assign);
forward_binop!(Sub, sub, SubAssign, sub_assign);
forward_binop!(Mul, mul, MulAssign, mul_assign);

impl<const DIGITS: usize> FromStr for Decimal<DIGITS> {
    type Err = Error;

    /// Accepts the same literals as the other backends; exponents are
    /// bounded by [`MAX_DECIMAL_EXPONENT`](crate::MAX_DECIMAL_EXPONENT).
    fn from_str(s: &str) -> Result<Self> {
        let err = || Error::Parse { input: s.to_owned() };
        let (mantissa, exp) = real::parse_bounded(s)?;
        let significand = mantissa.to_string().parse::<IBig>().map_err(|_| err())?;
        let exponent = isize::try_from(exp).map_err(|_| err())?;
        Ok(Self::from_parts(significand, exponent))
    }
}

impl<const DIGITS: usize> fmt::Display for Decimal<DIGITS> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<const DIGITS: usize> Real for Decimal<DIGITS> {
    #[inline(always)]
    fn parse_decimal(s: &str) -> Result<Self> {
        s.parse()
    }

    fn checked_div(&self, rhs: &Self) -> Option<Self> {
        if rhs.is_zero() {
            None
        } else {
            Some(Decimal(&self.0 / &rhs.0))
        }
    }

    #[inline]
    fn abs(&self) -> Self {
        if self.0 < DBig::ZERO {
            -self
        } else {
            self.clone()
        }
    }

    #[inline]
    fn pow10(exp: i32) -> Self {
        let exponent = isize::try_from(exp).unwrap_or(if exp < 0 { isize::MIN } else { isize::MAX });
        Self::from_parts(IBig::ONE, exponent)
    }

    fn round_places(&self, places: u32) -> Self {
        Self::from(self.scaled_round(places) / ten_to(places).with_precision(DIGITS).value())
    }

    fn to_fixed(&self, places: u32) -> String {
        real::format_fixed(&self.scaled_round(places).to_int().value(), places)
    }
}
