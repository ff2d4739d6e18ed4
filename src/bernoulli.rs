//! Bernoulli's method: the recurrence, single-root extraction, deflation
//! and the driver that chains them.

use core::{
    fmt,
    iter::{
        self,
        FusedIterator,
    },
};
use std::collections::VecDeque;

use log::{
    debug,
    trace,
    warn,
};

use crate::{
    CloseTo,
    Error,
    Poly,
    Real,
    Result,
    Tolerance,
};

/// Default residual bound is 10<sup>`DEFAULT_TOLERANCE_EXP`</sup>.
pub const DEFAULT_TOLERANCE_EXP: i32 = -42;

/// Default cap on recurrence steps per root.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Default number of decimal places kept in deflated coefficients.
pub const DEFAULT_CLAMP_PLACES: u32 = 6;

/// Settings for root extraction.
///
/// ```
/// # use bernoulli_roots::*;
/// let params = SolverParams::<f64>::new(Some(1e-9), None);
/// assert_eq!(params.max_iterations, DEFAULT_MAX_ITERATIONS);
/// assert_eq!(params.clamp_places, Some(6));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SolverParams<R> {
    /// An estimate is accepted once the polynomial's absolute value there
    /// is strictly below this bound.
    pub tolerance: R,

    /// Recurrence steps allowed per root before giving up.
    pub max_iterations: usize,

    /// Decimal places each deflated coefficient is rounded to before it is
    /// reused, or `None` to keep full precision.
    ///
    /// Rounding keeps coefficient sizes bounded across repeated deflation,
    /// at the cost of a small perturbation of the later roots.
    pub clamp_places: Option<u32>,
}

impl<R: Real> SolverParams<R> {
    /// Creates settings with the given bounds.
    ///
    /// Missing arguments fall back to 10<sup>-42</sup> and
    /// [`DEFAULT_MAX_ITERATIONS`]; the clamp is [`DEFAULT_CLAMP_PLACES`].
    pub fn new(tolerance: Option<R>, max_iterations: Option<usize>) -> Self {
        Self {
            tolerance: tolerance.unwrap_or_else(|| R::pow10(DEFAULT_TOLERANCE_EXP)),
            max_iterations: max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
            clamp_places: Some(DEFAULT_CLAMP_PLACES),
        }
    }
}

impl<R: Real> Default for SolverParams<R> {
    #[inline(always)]
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Converts `a_0, a_1, ..., a_n` into the recurrence weights
/// `w_i = -a_(i+1) / a_0`.
///
/// ```
/// # use bernoulli_roots::*;
/// let p = Poly::new(vec![2., -6., 4.]).unwrap();
/// assert_eq!(make_weights(&p).unwrap(), [3., -2.]);
/// ```
pub fn make_weights<R: Real>(p: &Poly<R>) -> Result<Vec<R>> {
    let (leading, rest) = match p.coeffs().split_first() {
        Some((leading, rest)) if !rest.is_empty() => (leading, rest),
        _ => return Err(Error::InvalidPolynomial {
            reason: "a constant polynomial has no roots".to_owned(),
        }),
    };
    let divisor = -leading.clone();
    rest.iter()
        .map(|a| a.checked_div(&divisor).ok_or_else(|| Error::InvalidPolynomial {
            reason: "leading coefficient is zero".to_owned(),
        }))
        .collect()
}

/// The linear recurrence `F(n) = w_0 F(n-1) + w_1 F(n-2) + ... + w_(N-1) F(n-N)`.
///
/// The sequence is seeded with `F(0) = ... = F(N-2) = 0` and `F(N-1) = 1`.
/// Iterating yields `F(N), F(N+1), ...` without end; only the last N terms
/// are kept.
///
/// ```
/// # use bernoulli_roots::*;
/// // x^2 - x - 1 gives the Fibonacci numbers
/// let fib = Recurrence::new(vec![1., 1.]);
/// assert_eq!(fib.take(6).collect::<Vec<_>>(), [1., 2., 3., 5., 8., 13.]);
/// ```
#[derive(Debug, Clone)]
pub struct Recurrence<R> {
    weights: Vec<R>,
    // window[i] holds F(n-1-i) where F(n) is the next term
    window: VecDeque<R>,
}

impl<R: Real> Recurrence<R> {
    /// Starts the sequence for the given weights.
    pub fn new(weights: Vec<R>) -> Self {
        let mut window = VecDeque::with_capacity(weights.len());
        if !weights.is_empty() {
            window.push_back(R::one());
            window.extend(iter::repeat_with(R::zero).take(weights.len() - 1));
        }
        Self {
            weights,
            window,
        }
    }

    /// The recurrence order, i.e. the degree of the polynomial.
    #[inline(always)]
    pub fn order(&self) -> usize {
        self.weights.len()
    }

    /// Computes and returns the next term.
    pub fn advance(&mut self) -> R {
        let mut next = R::zero();
        for (w, f) in self.weights.iter().zip(self.window.iter()) {
            let mut term = w.clone();
            term *= f;
            next += &term;
        }
        if self.window.pop_back().is_some() {
            self.window.push_front(next.clone());
        }
        next
    }

    /// Returns `true` once every remembered term is zero, after which the
    /// sequence stays zero forever.
    pub fn is_collapsed(&self) -> bool {
        self.window.iter().all(R::is_zero)
    }
}

impl<R: Real> Iterator for Recurrence<R> {
    type Item = R;

    #[inline(always)]
    fn next(&mut self) -> Option<R> {
        Some(self.advance())
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl<R: Real> FusedIterator for Recurrence<R> { }

/// A root accepted by [`find_root`].
#[derive(Debug, Clone, PartialEq)]
pub struct Root<R> {
    /// The root estimate `F(n) / F(n-1)`.
    pub value: R,

    /// Number of ratios examined, counting from 1; 0 when the root was
    /// read off a monomial.
    pub iterations: usize,

    /// The polynomial evaluated at `value`.
    pub residual: R,

    /// The recurrence terms `(F(n), F(n-1))` the estimate came from.
    pub terms: Option<(R, R)>,
}

/// Finds the root of largest magnitude with Bernoulli's method.
///
/// Draws recurrence terms, forms the ratio of each pair of consecutive
/// terms and stops at the first ratio whose residual is below
/// `params.tolerance`. A monomial `a X^k` has only the root 0, which is
/// returned directly; other polynomials with a zero constant coefficient
/// give up their nonzero roots first.
///
/// Fails with [`Error::NonConvergence`] after `params.max_iterations`
/// ratios, and with [`Error::Degenerate`] if the recurrence dies out.
///
/// ```
/// # use bernoulli_roots::*;
/// let p = Poly::<f64>::parse(&["1", "-5", "6"]).unwrap();
/// let root = find_root(&p, &SolverParams::new(Some(1e-10), None)).unwrap();
/// assert!((root.value - 3.).abs() < 1e-9);
/// ```
pub fn find_root<R: Real>(p: &Poly<R>, params: &SolverParams<R>) -> Result<Root<R>> {
    let weights = make_weights(p)?;
    if weights.iter().all(R::is_zero) {
        debug!("{} is a monomial, taking 0 as a root", p);
        return Ok(zero_root(0));
    }

    let close = Tolerance::new(params.tolerance.clone());
    let mut seq = Recurrence::new(weights);
    let mut prev = seq.advance();
    for n in 1..=params.max_iterations {
        let cur = seq.advance();
        match cur.checked_div(&prev) {
            Some(x) => {
                let y = p.eval(&x);
                trace!("n = {}: x = {}, f(x) = {}", n, x, y);
                if close.close_to_zero(&y) {
                    debug!("root {} of degree {} polynomial accepted after {} iterations",
                        x, p.degree(), n);
                    return Ok(Root {
                        value: x,
                        iterations: n,
                        residual: y,
                        terms: Some((cur, prev)),
                    });
                }
            },
            None if seq.is_collapsed() && p.constant().is_zero() => {
                debug!("recurrence for {} collapsed, taking 0 as a root", p);
                return Ok(zero_root(n));
            },
            None if seq.is_collapsed() => {
                return Err(Error::Degenerate {
                    degree: p.degree(),
                    iterations: n,
                });
            },
            None => trace!("n = {}: previous term is zero, no estimate", n),
        }
        prev = cur;
    }

    warn!("no convergence for {} after {} iterations", p, params.max_iterations);
    Err(Error::NonConvergence {
        degree: p.degree(),
        iterations: params.max_iterations,
    })
}

fn zero_root<R: Real>(iterations: usize) -> Root<R> {
    Root {
        value: R::zero(),
        iterations,
        residual: R::zero(),
        terms: None,
    }
}

/// Divides `p` by `(X - x)` with synthetic division and returns the quotient.
///
/// Each quotient coefficient is rounded to `clamp_places` decimal places
/// before it feeds the next one. The remainder is dropped; it is near zero
/// whenever `x` is an accepted root.
///
/// ```
/// # use bernoulli_roots::*;
/// let p = Poly::new(vec![1., -6., 11., -6.]).unwrap();
/// let q = deflate(&p, &3.0000001, Some(6)).unwrap();
/// assert_eq!(q.coeffs(), [1., -3., 2.]);
/// ```
pub fn deflate<R: Real>(p: &Poly<R>, x: &R, clamp_places: Option<u32>) -> Result<Poly<R>> {
    let clamp = |v: R| match clamp_places {
        Some(places) => v.round_places(places),
        None => v,
    };
    let (leading, rest) = match p.coeffs().split_first() {
        Some((leading, rest)) if !rest.is_empty() => (leading, rest),
        _ => return Err(Error::InvalidPolynomial {
            reason: "cannot deflate a constant polynomial".to_owned(),
        }),
    };

    let mut quotient = Vec::with_capacity(rest.len());
    quotient.push(clamp(leading.clone()));
    let mut remainder = R::zero();
    for (i, coeff) in rest.iter().enumerate() {
        let mut b = quotient[i].clone();
        b *= x;
        b += coeff;
        if i + 1 < rest.len() {
            quotient.push(clamp(b));
        } else {
            remainder = b;
        }
    }
    debug!("deflating {} by x = {} leaves remainder {}", p, x, remainder);
    Poly::new(quotient)
}

/// Finds the dominant root of `p` and returns it with the deflated polynomial.
pub fn extract<R: Real>(p: &Poly<R>, params: &SolverParams<R>) -> Result<(Root<R>, Poly<R>)> {
    let root = find_root(p, params)?;
    let reduced = deflate(p, &root.value, params.clamp_places)?;
    Ok((root, reduced))
}

/// One extracted root together with the polynomial it was extracted from.
///
/// The [`Display`](fmt::Display) impl writes a report block; the formatter
/// precision (default 6) sets the places of the rounded lines.
///
/// ```
/// # use bernoulli_roots::*;
/// let p = Poly::<Decimal120>::parse(&["1", "-1"]).unwrap();
/// let e = Solver::new(p, SolverParams::default()).next().unwrap().unwrap();
/// assert!(format!("{:.2}", e).contains("--> x = 1.00"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction<R> {
    /// The polynomial the root belongs to.
    pub poly: Poly<R>,

    /// The accepted root.
    pub root: Root<R>,
}

impl<R: Real> fmt::Display for Extraction<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let places = f.precision().unwrap_or(DEFAULT_CLAMP_PLACES as usize) as u32;
        let root = &self.root;
        writeln!(f, "{}", self.poly)?;
        writeln!(f)?;
        writeln!(f, "    n = {}", root.iterations)?;
        writeln!(f)?;
        if let Some((cur, prev)) = &root.terms {
            writeln!(f, "    Fn(n  ) = {}", cur)?;
            writeln!(f, "    Fn(n-1) = {}", prev)?;
            writeln!(f)?;
        }
        writeln!(f, "    x = {}", root.value)?;
        writeln!(f, "--> x = {}", root.value.to_fixed(places))?;
        writeln!(f)?;
        writeln!(f, "    f(x) = {}", root.residual)?;
        write!(f, "    f(x) = {}", root.residual.to_fixed(places))
    }
}

/// Extracts roots one at a time, deflating after each.
///
/// Each item is the next root in order of extraction. Iteration ends when
/// the polynomial is reduced to a constant, or right after the first error.
#[derive(Debug, Clone)]
pub struct Solver<R> {
    poly: Option<Poly<R>>,
    params: SolverParams<R>,
}

impl<R: Real> Solver<R> {
    /// Starts extracting roots of `poly`.
    pub fn new(poly: Poly<R>, params: SolverParams<R>) -> Self {
        Self {
            poly: Some(poly),
            params,
        }
    }

    /// The polynomial still to be solved, or `None` after an error.
    #[inline(always)]
    pub fn remaining(&self) -> Option<&Poly<R>> {
        self.poly.as_ref()
    }
}

impl<R: Real> Iterator for Solver<R> {
    type Item = Result<Extraction<R>>;

    fn next(&mut self) -> Option<Self::Item> {
        let poly = self.poly.take()?;
        if poly.degree() == 0 {
            self.poly = Some(poly);
            return None;
        }
        Some(extract(&poly, &self.params).map(|(root, reduced)| {
            self.poly = Some(reduced);
            Extraction {
                poly,
                root,
            }
        }))
    }
}

impl<R: Real> FusedIterator for Solver<R> { }

/// Extracts every root of `p`, in order of extraction.
///
/// Fails on a constant polynomial and on the first root that cannot be
/// extracted.
pub fn solve<R: Real>(p: Poly<R>, params: &SolverParams<R>) -> Result<Vec<Extraction<R>>> {
    if p.degree() == 0 {
        return Err(Error::InvalidPolynomial {
            reason: "a constant polynomial has no roots".to_owned(),
        });
    }
    Solver::new(p, params.clone()).collect()
}

#[cfg(test)]
mod tests {
    use num_rational::BigRational;
    use num_traits::Zero;
    use rand::{
        rngs::StdRng,
        seq::SliceRandom,
        Rng,
        SeedableRng,
    };
    use super::*;
    use crate::Decimal120;

    type D = Decimal120;

    fn d(s: &str) -> D {
        s.parse().unwrap()
    }

    fn poly(coeffs: &[&str]) -> Poly<D> {
        Poly::parse(coeffs).unwrap()
    }

    fn cubic() -> Poly<D> {
        poly(&["1.0", "-6.0", "11.0", "-6.0"])
    }

    #[test]
    fn weights() {
        assert_eq!(make_weights(&cubic()).unwrap(), [d("6"), d("-11"), d("6")]);
        assert_eq!(make_weights(&poly(&["2", "1", "-4"])).unwrap(), [d("-0.5"), d("2")]);
        assert!(matches!(make_weights(&poly(&["7"])), Err(Error::InvalidPolynomial { .. })));
    }

    #[test]
    fn recurrence_terms() {
        // complete homogeneous symmetric polynomials of 1, 2, 3
        let seq = Recurrence::new(make_weights(&cubic()).unwrap());
        assert_eq!(seq.order(), 3);
        let terms: Vec<D> = seq.take(5).collect();
        assert_eq!(terms, [d("6"), d("25"), d("90"), d("301"), d("966")]);

        let mut a = Recurrence::new(vec![d("2")]);
        let mut b = a.clone();
        assert_eq!(a.next(), Some(d("2")));
        assert_eq!(a.next(), Some(d("4")));
        assert_eq!(b.next(), Some(d("2")));
    }

    #[test]
    fn collapse() {
        let mut seq = Recurrence::new(vec![d("0"), d("0")]);
        assert!(!seq.is_collapsed());
        assert!(seq.advance().is_zero());
        assert!(!seq.is_collapsed());
        assert!(seq.advance().is_zero());
        assert!(seq.is_collapsed());
    }

    #[test]
    fn dominant_root_of_cubic() {
        let p = cubic();
        let root = find_root(&p, &SolverParams::default()).unwrap();
        assert_eq!(root.value.to_fixed(6), "3.000000");
        assert!(root.residual.abs() < D::pow10(-42));
        assert!(root.iterations <= 250, "took {} iterations", root.iterations);
        let (cur, prev) = root.terms.clone().unwrap();
        assert_eq!(cur.checked_div(&prev), Some(root.value.clone()));
        assert_eq!(p.eval(&root.value), root.residual);

        let loose = SolverParams::new(Some(D::pow10(-12)), Some(100));
        let root = find_root(&p, &loose).unwrap();
        assert!(root.residual.abs() < D::pow10(-12));
        assert!(Tolerance::new(D::pow10(-12)).close_to(&root.value, &d("3")));
    }

    #[test]
    fn solves_cubic_largest_first() {
        let extractions = solve(cubic(), &SolverParams::default()).unwrap();
        let roots: Vec<_> = extractions.iter().map(|e| e.root.value.to_fixed(6)).collect();
        assert_eq!(roots, ["3.000000", "2.000000", "1.000000"]);
        assert_eq!(extractions[0].poly, cubic());
        assert_eq!(extractions[1].poly, poly(&["1", "-3", "2"]));
        assert_eq!(extractions[2].poly, poly(&["1", "-1"]));
        assert_eq!(extractions[2].root.iterations, 1);
        assert_eq!(extractions[2].root.value, d("1"));
        assert!(extractions.iter().all(|e| e.root.residual.abs() < D::pow10(-42)));
    }

    #[test]
    fn solver_threads_polynomial() {
        let mut solver = Solver::new(cubic(), SolverParams::default());
        assert_eq!(solver.remaining(), Some(&cubic()));
        assert!(solver.next().unwrap().is_ok());
        assert_eq!(solver.remaining(), Some(&poly(&["1", "-3", "2"])));
        assert_eq!(solver.by_ref().count(), 2);
        assert_eq!(solver.remaining(), Some(&poly(&["1"])));
        assert!(solver.next().is_none());
    }

    #[test]
    fn report_block() {
        let extractions = solve(poly(&["1", "-1"]), &SolverParams::default()).unwrap();
        assert_eq!(extractions[0].to_string(), "[1, -1]\n\n    n = 1\n\n\
            \x20   Fn(n  ) = 1\n    Fn(n-1) = 1\n\n    x = 1\n--> x = 1.000000\n\n\
            \x20   f(x) = 0\n    f(x) = 0.000000");
        assert!(format!("{:.2}", extractions[0]).contains("--> x = 1.00\n"));

        let zero = solve(poly(&["1", "0"]), &SolverParams::default()).unwrap();
        assert!(!zero[0].to_string().contains("Fn"));
    }

    #[test]
    fn deflation_clamps_each_coefficient() {
        let p = cubic();
        let x = d("3.0000000001");
        assert_eq!(deflate(&p, &x, Some(6)).unwrap(), poly(&["1", "-3", "2"]));
        assert_eq!(deflate(&p, &x, None).unwrap(),
            poly(&["1", "-2.9999999999", "2.00000000000000000001"]));
        assert_eq!(deflate(&p, &x, Some(2)), deflate(&p, &d("3"), None));
        assert!(matches!(deflate(&poly(&["4"]), &x, Some(6)), Err(Error::InvalidPolynomial { .. })));
        // the leading coefficient can be lost to the clamp
        assert!(deflate(&poly(&["0.0000001", "1"]), &d("-1e7"), Some(6)).is_err());
    }

    #[test]
    fn rejects_degenerate_input() {
        assert!(matches!(Poly::<D>::parse(&["0", "1"]), Err(Error::InvalidPolynomial { .. })));
        assert!(matches!(solve(poly(&["5"]), &SolverParams::default()),
            Err(Error::InvalidPolynomial { .. })));
    }

    #[test]
    fn equal_magnitude_roots_do_not_converge() {
        let params = SolverParams::new(None, Some(500));
        match find_root(&poly(&["1", "0", "-1"]), &params) {
            Err(Error::NonConvergence { degree: 2, iterations: 500 }) => (),
            other => panic!("unexpected {:?}", other),
        }

        let mut solver = Solver::new(poly(&["1", "0", "-1"]), params);
        assert!(solver.next().unwrap().is_err());
        assert!(solver.next().is_none());
        assert_eq!(solver.remaining(), None);
    }

    #[test]
    fn zero_roots_come_out_in_magnitude_order() {
        let extractions = solve(poly(&["1", "-3", "0"]), &SolverParams::default()).unwrap();
        let roots: Vec<_> = extractions.iter().map(|e| e.root.value.to_fixed(6)).collect();
        assert_eq!(roots, ["3.000000", "0.000000"]);
        assert_eq!(extractions[0].root.iterations, 1);
        assert_eq!(extractions[1].poly, poly(&["1", "0"]));
        assert_eq!(extractions[1].root.iterations, 0);
        assert_eq!(extractions[1].root.terms, None);

        let roots: Vec<_> = solve(poly(&["2", "-2", "-4", "0", "0"]), &SolverParams::default()).unwrap()
            .iter().map(|e| e.root.value.to_fixed(6)).collect();
        assert_eq!(roots, ["2.000000", "-1.000000", "0.000000", "0.000000"]);

        let cube = find_root(&poly(&["5", "0", "0", "0"]), &SolverParams::default()).unwrap();
        assert!(cube.value.is_zero());
        assert_eq!(cube.iterations, 0);
    }

    #[test]
    fn collapsed_recurrence_is_an_error() {
        // 1e-200 squared underflows to zero in f64
        let p = Poly::<f64>::parse(&["1", "1e-200"]).unwrap();
        let params = SolverParams::new(Some(0.), Some(100));
        assert_eq!(find_root(&p, &params), Err(Error::Degenerate { degree: 1, iterations: 2 }));
    }

    #[test]
    fn float_backend() {
        let p = Poly::<f64>::parse(&["1.0", "-6.0", "11.0", "-6.0"]).unwrap();
        let params = SolverParams::new(Some(1e-10), Some(1000));
        let roots: Vec<f64> = solve(p, &params).unwrap().into_iter().map(|e| e.root.value).collect();
        assert_eq!(roots.len(), 3);
        for (r, expected) in roots.iter().zip([3., 2., 1.].iter()) {
            assert!((r - expected).abs() < 1e-6, "{} != {}", r, expected);
        }
    }

    #[test]
    fn rational_backend() {
        let p = Poly::<BigRational>::parse(&["1", "-6", "11", "-6"]).unwrap();
        let params = SolverParams::new(Some(<BigRational as Real>::pow10(-20)), None);
        let roots: Vec<_> = solve(p, &params).unwrap()
            .iter().map(|e| e.root.value.to_fixed(6)).collect();
        assert_eq!(roots, ["3.000000", "2.000000", "1.000000"]);
    }

    #[test]
    fn reconstructs_from_extracted_roots() {
        // 2(x - 3)(x + 2)(x - 1/2)
        let original = poly(&["2", "-3", "-11", "6"]);
        let extractions = solve(original.clone(), &SolverParams::default()).unwrap();
        let roots: Vec<D> = extractions.iter().map(|e| e.root.value.clone()).collect();
        assert_eq!(roots.iter().map(|r| r.to_fixed(6)).collect::<Vec<_>>(),
            ["3.000000", "-2.000000", "0.500000"]);

        let rebuilt = Poly::from_roots(original.leading().clone(), &roots).unwrap();
        assert_eq!(rebuilt.degree(), original.degree());
        let close = Tolerance::new(D::pow10(-6));
        assert!(close.close_to_iter(rebuilt.coeffs().iter(), original.coeffs().iter()));
    }

    #[test]
    fn random_integer_roots() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..8 {
            let degree: usize = rng.gen_range(1, 5);
            let mut magnitudes: Vec<i64> = (1..=9).collect();
            magnitudes.shuffle(&mut rng);
            let mut roots: Vec<i64> = magnitudes[..degree].iter()
                .map(|&m| if rng.gen::<bool>() { -m } else { m })
                .collect();
            let leading: i64 = rng.gen_range(1, 4);

            let as_d = |x: &i64| d(&x.to_string());
            let p = Poly::from_roots(as_d(&leading), &roots.iter().map(as_d).collect::<Vec<_>>()).unwrap();
            let extractions = solve(p.clone(), &SolverParams::default()).unwrap();

            roots.sort_by_key(|r| -r.abs());
            let found: Vec<String> = extractions.iter().map(|e| e.root.value.to_fixed(6)).collect();
            let expected: Vec<String> = roots.iter().map(|r| format!("{}.000000", r)).collect();
            assert_eq!(found, expected, "roots of {}", p);
        }
    }
}
