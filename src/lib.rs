#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(macro_use_extern_crate)]
#![warn(rustdoc::invalid_html_tags)]
#![warn(missing_debug_implementations)]
#![warn(unreachable_pub)]
#![warn(unused_extern_crates)]
#![warn(unused_lifetimes)]

//! Real polynomial roots by Bernoulli's method and deflation.
//!
//! Bernoulli's method runs the linear recurrence whose characteristic
//! polynomial is the input polynomial. When the polynomial has a single real
//! root of strictly largest magnitude, the ratio of consecutive recurrence
//! terms converges to that root. Once the residual at the ratio is small
//! enough, the root is divided out by synthetic division and the process
//! repeats on the reduced polynomial until only a constant is left.
//!
//! Coefficients are stored highest degree first. The [`Poly`] type works
//! over any [`Real`] backend; [`Decimal120`] gives 120 significant decimal
//! digits and is what the defaults in [`SolverParams`] are tuned for.
//!
//! ```
//! use bernoulli_roots::{Decimal120, Poly, Real, SolverParams, solve};
//!
//! // x^3 - 6x^2 + 11x - 6 = (x - 1)(x - 2)(x - 3)
//! let p = Poly::<Decimal120>::parse(&["1.0", "-6.0", "11.0", "-6.0"]).unwrap();
//! let roots: Vec<String> = solve(p, &SolverParams::default()).unwrap()
//!     .iter()
//!     .map(|e| e.root.value.to_fixed(6))
//!     .collect();
//!
//! // the dominant root always comes out first
//! assert_eq!(roots, ["3.000000", "2.000000", "1.000000"]);
//! ```
//!
//! # Convergence
//!
//! Only real roots are found. If two roots share the largest magnitude
//! (a `±r` pair or a complex-conjugate pair) the ratios never settle, and
//! [`find_root`] gives up with [`Error::NonConvergence`] after
//! [`SolverParams::max_iterations`] steps.
//!
//! ```
//! # use bernoulli_roots::*;
//! let p = Poly::<Decimal120>::parse(&["1", "0", "-1"]).unwrap();
//! let params = SolverParams::new(None, Some(200));
//! assert!(matches!(find_root(&p, &params), Err(Error::NonConvergence { .. })));
//! ```

use core::{
    fmt,
    ops::{
        Mul,
        AddAssign,
        MulAssign,
    },
};
use custom_error::custom_error;
use num_traits::Zero;

mod real;
mod decimal;
mod bernoulli;

pub use crate::{
    real::{
        Real,
        MAX_DECIMAL_EXPONENT,
    },
    decimal::{
        Decimal,
        Decimal120,
    },
    bernoulli::{
        make_weights,
        find_root,
        deflate,
        extract,
        solve,
        Recurrence,
        Root,
        Extraction,
        Solver,
        SolverParams,
        DEFAULT_TOLERANCE_EXP,
        DEFAULT_MAX_ITERATIONS,
        DEFAULT_CLAMP_PLACES,
    },
};

custom_error!{
    /// Errors from polynomial construction and root extraction.
    #[derive(PartialEq)]
    pub Error
        /// The coefficient list is empty, has a zero leading coefficient,
        /// or is a constant where a root was requested.
        InvalidPolynomial{reason: String} = "invalid polynomial: {reason}",
        /// A coefficient literal is not a decimal number.
        Parse{input: String} = "cannot parse `{input}` as a decimal number",
        /// The root estimates did not meet the tolerance within the iteration cap.
        NonConvergence{degree: usize, iterations: usize}
            = "no root of the degree {degree} polynomial converged within {iterations} iterations",
        /// Every recurrence term in the window became zero.
        Degenerate{degree: usize, iterations: usize}
            = "recurrence for the degree {degree} polynomial collapsed to zero after {iterations} iterations",
}

/// Shorthand for results carrying this crate's [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// A possibly-stateful comparison for approximate values.
///
/// Implementors decide when two values, or a value and zero, should count
/// as equal. The root extractor accepts an estimate once its residual is
/// [`close_to_zero`](CloseTo::close_to_zero).
pub trait CloseTo {
    /// The type of thing that can be compared.
    type Item;

    /// Returns `true` iff `x` is approximately equal to `y`.
    fn close_to(&self, x: &Self::Item, y: &Self::Item) -> bool;

    /// Indicates `true` if `x` is approximately zero.
    fn close_to_zero(&self, x: &Self::Item) -> bool;

    /// Checks closeness over an iteration.
    fn close_to_iter<'a, Iter1, Iter2>(&'a self, x: Iter1, y: Iter2) -> bool
    where Iter1: Iterator<Item=&'a Self::Item>,
          Iter2: Iterator<Item=&'a Self::Item>,
    {
        x.zip(y).all(|(xi, yi)| self.close_to(xi, yi))
    }
}

/// Absolute closeness: values are close when they differ by strictly less
/// than `eps`.
///
/// ```
/// # use bernoulli_roots::*;
/// let test = Tolerance::new(0.01f64);
/// assert!(test.close_to(&1.0, &1.005));
/// assert!(test.close_to_zero(&-0.009));
/// assert!(! test.close_to(&2.0, &2.02));
/// assert!(! test.close_to_zero(&0.01));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tolerance<R> {
    /// Exclusive bound on the absolute difference.
    pub eps: R,
}

impl<R: Real> Tolerance<R> {
    /// Creates a closeness tester with the given bound.
    #[inline(always)]
    pub fn new(eps: R) -> Self {
        Self {
            eps,
        }
    }
}

impl<R: Real> CloseTo for Tolerance<R> {
    type Item = R;

    #[inline]
    fn close_to(&self, x: &R, y: &R) -> bool {
        (x.clone() - y.clone()).abs() < self.eps
    }

    #[inline]
    fn close_to_zero(&self, x: &R) -> bool {
        x.abs() < self.eps
    }
}

/// A univariate polynomial with real coefficients, highest degree first.
///
/// `Poly::new(vec![a0, a1, ..., an])` represents
/// a0 x<sup>n</sup> + a1 x<sup>n-1</sup> + ... + an.
/// The coefficient list is never empty and its leading coefficient is
/// never zero, so the degree is always well defined.
///
/// ```
/// # use bernoulli_roots::*;
/// let f = Poly::new(vec![2., 0., -1.]).unwrap();
/// assert_eq!(f.degree(), 2);
/// assert_eq!(f.eval(&3.), 17.);
///
/// let g = Poly::new(vec![1., 4.]).unwrap();
/// assert_eq!((&f * &g).coeffs(), [2., 8., -1., -4.]);
///
/// assert!(Poly::new(vec![0., 1.]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poly<R> {
    coeffs: Vec<R>,
}

impl<R: Real> Poly<R> {
    /// Creates a polynomial from its coefficients, highest degree first.
    ///
    /// Fails if `coeffs` is empty or its first entry is zero.
    pub fn new(coeffs: Vec<R>) -> Result<Self> {
        match coeffs.first() {
            None => Err(Error::InvalidPolynomial {
                reason: "no coefficients given".to_owned(),
            }),
            Some(leading) if leading.is_zero() => Err(Error::InvalidPolynomial {
                reason: "leading coefficient is zero".to_owned(),
            }),
            Some(_) => Ok(Self { coeffs }),
        }
    }

    /// Parses decimal coefficient literals, highest degree first.
    ///
    /// ```
    /// # use bernoulli_roots::*;
    /// let p = Poly::<Decimal120>::parse(&["1.0", "-6.0", "11.0", "-6.0"]).unwrap();
    /// assert_eq!(p.to_string(), "[1, -6, 11, -6]");
    /// assert!(matches!(Poly::<f64>::parse(&["1", "six"]), Err(Error::Parse { .. })));
    /// ```
    pub fn parse<S: AsRef<str>>(literals: impl IntoIterator<Item=S>) -> Result<Self> {
        literals.into_iter()
            .map(|s| R::parse_decimal(s.as_ref()))
            .collect::<Result<Vec<_>>>()
            .and_then(Self::new)
    }

    /// Builds `leading * (X - r1) * (X - r2) * ...`.
    pub fn from_roots(leading: R, roots: &[R]) -> Result<Self> {
        let mut out = Self::new(vec![leading])?;
        for root in roots {
            out = &out * &Self::new(vec![R::one(), -root.clone()])?;
        }
        Ok(out)
    }

    /// The degree, `len(coeffs) - 1`.
    #[inline(always)]
    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    /// The coefficients, highest degree first.
    #[inline(always)]
    pub fn coeffs(&self) -> &[R] {
        &self.coeffs
    }

    /// The nonzero leading coefficient.
    #[inline(always)]
    pub fn leading(&self) -> &R {
        &self.coeffs[0]
    }

    /// The constant coefficient.
    #[inline(always)]
    pub fn constant(&self) -> &R {
        &self.coeffs[self.degree()]
    }

    /// Evaluate this polynomial at the given point.
    ///
    /// Uses Horner's rule to perform the evaluation using exactly d multiplications
    /// and d additions, where d is the degree of self.
    #[inline(always)]
    pub fn eval(&self, x: &R) -> R {
        horner_slice(&self.coeffs, x)
    }
}

impl<R: fmt::Display> fmt::Display for Poly<R> {
    /// Writes the coefficient list, e.g. `[1, -6, 11, -6]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, c) in self.coeffs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", c)?;
        }
        f.write_str("]")
    }
}

impl<'a,'b,R> Mul<&'b Poly<R>> for &'a Poly<R>
where R: Real,
{
    type Output = Poly<R>;

    fn mul(self, rhs: &'b Poly<R>) -> Poly<R> {
        let clen = self.coeffs.len() + rhs.coeffs.len() - 1;
        let mut out = Vec::with_capacity(clen);
        out.resize_with(clen, R::zero);
        classical_slice_mul(&mut out, &self.coeffs, &rhs.coeffs);
        // the product of two nonzero leading coefficients is nonzero
        Poly {
            coeffs: out,
        }
    }
}

fn classical_slice_mul<T>(output: &mut [T], lhs: &[T], rhs: &[T])
where T: Clone + for<'a> AddAssign<&'a T> + for<'a> MulAssign<&'a T>,
{
    assert_eq!(lhs.len() + rhs.len(), output.len() + 1);

    for (i, a) in lhs.iter().enumerate() {
        for (j, b) in rhs.iter().enumerate() {
            let mut term = a.clone();
            term *= b;
            output[i + j] += &term;
        }
    }
}

fn horner_slice<T>(coeffs: &[T], x: &T) -> T
where T: Clone + Zero + for<'c> MulAssign<&'c T> + for<'c> AddAssign<&'c T>,
{
    let mut coeffs = coeffs.iter();
    match coeffs.next() {
        Some(leading) => {
            let mut out = leading.clone();
            for coeff in coeffs {
                out *= x;
                out += coeff;
            }
            out
        },
        None => T::zero(),
    }
}
