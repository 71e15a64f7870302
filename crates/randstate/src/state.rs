//! The sampling facade.
//!
//! [`RandomState`] owns one engine behind a [`WordSource`] and serialises
//! every sampling call through a single mutex, together with the Gaussian and
//! binomial caches the legacy samplers share. Parameter validation happens
//! before the lock is taken and before any bits are consumed, so a rejected
//! call never perturbs the stream.
//!
//! Domain checks are written so that NaN *shape* parameters whose NaN the
//! reference stream propagates (von Mises concentration, noncentrality, gamma
//! shape) pass through and surface as a NaN sample, while NaN parameters
//! that would drive an integer-valued sampler into undefined territory are
//! rejected.

use std::sync::{Mutex, MutexGuard, PoisonError};

use randstate_core::BitSource;

use crate::adapter::WordSource;
use crate::bounded::BoundedInt;
use crate::distributions::{continuous, discrete, BinomialCache, GaussCache};
use crate::engine::Engine;
use crate::error::RandstateError;

/// Largest Poisson mean for which the deviate still fits the output type.
const POISSON_LAM_MAX: f64 = 9.223372006484771e18;

struct Inner<E> {
    source: WordSource<E>,
    gauss: GaussCache,
    binomial: BinomialCache,
}

/// Replay facade over one caller-supplied engine.
///
/// All methods take `&self`; a facade shared across threads serialises its
/// callers, and each sampling call consumes a contiguous span of the raw
/// stream. Facades share no state with each other.
pub struct RandomState<E: Engine> {
    inner: Mutex<Inner<E>>,
}

impl<E: Engine> RandomState<E> {
    /// Wrap `engine`, probing its output shape once.
    ///
    /// Fails only when the declared shape cannot be normalised into 64-bit
    /// words.
    pub fn new(engine: E) -> Result<Self, RandstateError> {
        Ok(Self {
            inner: Mutex::new(Inner {
                source: WordSource::new(engine)?,
                gauss: GaussCache::new(),
                binomial: BinomialCache::new(),
            }),
        })
    }

    // A panicking sampler leaves only cache state behind, and every cache
    // state is valid, so a poisoned lock is safe to reclaim.
    fn lock(&self) -> MutexGuard<'_, Inner<E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One canonical 32-bit word.
    pub fn next_u32(&self) -> u32 {
        self.lock().source.next_u32()
    }

    /// One canonical 64-bit word.
    pub fn next_u64(&self) -> u64 {
        self.lock().source.next_u64()
    }

    /// One native engine block, zero-extended.
    pub fn next_raw(&self) -> u64 {
        self.lock().source.next_raw()
    }

    /// One double in `[0, 1)` with 53 significant bits.
    pub fn random_sample(&self) -> f64 {
        self.lock().source.next_f64()
    }

    /// Uniform double in `[low, low + (high - low))`.
    ///
    /// `low > high` is allowed and mirrors the interval. Fails when
    /// `high - low` is not finite.
    pub fn uniform(&self, low: f64, high: f64) -> Result<f64, RandstateError> {
        let range = high - low;
        if !range.is_finite() {
            return Err(RandstateError::NonFiniteRange { low, high });
        }
        let mut inner = self.lock();
        Ok(low + range * inner.source.next_f64())
    }

    /// Uniform double in `[0, high)`.
    pub fn uniform_to(&self, high: f64) -> Result<f64, RandstateError> {
        self.uniform(0.0, high)
    }

    /// Uniform integer in the inclusive range `[low, high]`, masked mode.
    pub fn rand_int<T: BoundedInt>(&self, low: T, high: T) -> Result<T, RandstateError> {
        if low > high {
            return Err(RandstateError::EmptyRange);
        }
        let mut inner = self.lock();
        Ok(T::sample_bounded(&mut inner.source, low, high, true))
    }

    /// Uniform integer in the inclusive range `[0, high]` (or from the type's
    /// default origin), masked mode.
    pub fn rand_int_to<T: BoundedInt + Default>(&self, high: T) -> Result<T, RandstateError> {
        self.rand_int(T::default(), high)
    }

    /// Fill `out` with uniform integers from the inclusive range
    /// `[low, high]`, choosing masked or Lemire rejection.
    ///
    /// One call shares one narrow-draw buffer across the whole slice.
    pub fn rand_int_fill<T: BoundedInt>(
        &self,
        low: T,
        high: T,
        use_masked: bool,
        out: &mut [T],
    ) -> Result<(), RandstateError> {
        if low > high {
            return Err(RandstateError::EmptyRange);
        }
        let mut inner = self.lock();
        T::fill_bounded(&mut inner.source, low, high, use_masked, out);
        Ok(())
    }

    /// Standard Gaussian deviate (polar method with cached partner).
    pub fn rand_n(&self) -> f64 {
        let inner = &mut *self.lock();
        continuous::gauss(&mut inner.source, &mut inner.gauss)
    }

    /// Gaussian deviate with location and scale. Fails for `scale < 0`.
    pub fn normal(&self, loc: f64, scale: f64) -> Result<f64, RandstateError> {
        if scale < 0.0 {
            return Err(RandstateError::param("scale", scale));
        }
        let inner = &mut *self.lock();
        Ok(continuous::normal(
            &mut inner.source,
            &mut inner.gauss,
            loc,
            scale,
        ))
    }

    /// Unit-rate exponential deviate.
    pub fn standard_exponential(&self) -> f64 {
        continuous::standard_exponential(&mut self.lock().source)
    }

    /// Exponential deviate. Fails for `scale < 0`.
    pub fn exponential(&self, scale: f64) -> Result<f64, RandstateError> {
        if scale < 0.0 {
            return Err(RandstateError::param("scale", scale));
        }
        Ok(continuous::exponential(&mut self.lock().source, scale))
    }

    /// Standard gamma deviate. Fails for `shape < 0`; shape 0 yields 0.
    pub fn standard_gamma(&self, shape: f64) -> Result<f64, RandstateError> {
        if shape < 0.0 {
            return Err(RandstateError::param("shape", shape));
        }
        let inner = &mut *self.lock();
        Ok(continuous::standard_gamma(
            &mut inner.source,
            &mut inner.gauss,
            shape,
        ))
    }

    /// Gamma deviate. Fails for `shape < 0` or `scale < 0`.
    pub fn gamma(&self, shape: f64, scale: f64) -> Result<f64, RandstateError> {
        if shape < 0.0 {
            return Err(RandstateError::param("shape", shape));
        }
        if scale < 0.0 {
            return Err(RandstateError::param("scale", scale));
        }
        let inner = &mut *self.lock();
        Ok(continuous::gamma(
            &mut inner.source,
            &mut inner.gauss,
            shape,
            scale,
        ))
    }

    /// Beta deviate. Fails for `a <= 0` or `b <= 0`.
    pub fn beta(&self, a: f64, b: f64) -> Result<f64, RandstateError> {
        if a <= 0.0 {
            return Err(RandstateError::param("a", a));
        }
        if b <= 0.0 {
            return Err(RandstateError::param("b", b));
        }
        let inner = &mut *self.lock();
        Ok(continuous::beta(&mut inner.source, &mut inner.gauss, a, b))
    }

    /// Chi-square deviate. Fails for `df <= 0`.
    pub fn chisquare(&self, df: f64) -> Result<f64, RandstateError> {
        if df <= 0.0 {
            return Err(RandstateError::param("df", df));
        }
        let inner = &mut *self.lock();
        Ok(continuous::chisquare(&mut inner.source, &mut inner.gauss, df))
    }

    /// Noncentral chi-square deviate. Fails for `df <= 0` or `nonc < 0`;
    /// a NaN `nonc` consumes the reference draw pattern and yields NaN.
    pub fn noncentral_chisquare(&self, df: f64, nonc: f64) -> Result<f64, RandstateError> {
        if df <= 0.0 {
            return Err(RandstateError::param("df", df));
        }
        if nonc < 0.0 {
            return Err(RandstateError::param("nonc", nonc));
        }
        let inner = &mut *self.lock();
        Ok(continuous::noncentral_chisquare(
            &mut inner.source,
            &mut inner.gauss,
            df,
            nonc,
        ))
    }

    /// F deviate. Fails for non-positive degrees of freedom.
    pub fn f(&self, dfnum: f64, dfden: f64) -> Result<f64, RandstateError> {
        if dfnum <= 0.0 {
            return Err(RandstateError::param("dfnum", dfnum));
        }
        if dfden <= 0.0 {
            return Err(RandstateError::param("dfden", dfden));
        }
        let inner = &mut *self.lock();
        Ok(continuous::f(
            &mut inner.source,
            &mut inner.gauss,
            dfnum,
            dfden,
        ))
    }

    /// Noncentral F deviate. Fails for non-positive degrees of freedom or
    /// `nonc < 0`.
    pub fn noncentral_f(&self, dfnum: f64, dfden: f64, nonc: f64) -> Result<f64, RandstateError> {
        if dfnum <= 0.0 {
            return Err(RandstateError::param("dfnum", dfnum));
        }
        if dfden <= 0.0 {
            return Err(RandstateError::param("dfden", dfden));
        }
        if nonc < 0.0 {
            return Err(RandstateError::param("nonc", nonc));
        }
        let inner = &mut *self.lock();
        Ok(continuous::noncentral_f(
            &mut inner.source,
            &mut inner.gauss,
            dfnum,
            dfden,
            nonc,
        ))
    }

    /// Von Mises deviate on `(-pi, pi]`. Fails for `kappa < 0`; a NaN
    /// `kappa` yields NaN without consuming any draw.
    pub fn vonmises(&self, mu: f64, kappa: f64) -> Result<f64, RandstateError> {
        if kappa < 0.0 {
            return Err(RandstateError::param("kappa", kappa));
        }
        Ok(continuous::vonmises(&mut self.lock().source, mu, kappa))
    }

    /// Wald deviate. Fails for `mean <= 0` or `scale <= 0`.
    pub fn wald(&self, mean: f64, scale: f64) -> Result<f64, RandstateError> {
        if mean <= 0.0 {
            return Err(RandstateError::param("mean", mean));
        }
        if scale <= 0.0 {
            return Err(RandstateError::param("scale", scale));
        }
        let inner = &mut *self.lock();
        Ok(continuous::wald(
            &mut inner.source,
            &mut inner.gauss,
            mean,
            scale,
        ))
    }

    /// Pareto (Lomax) deviate. Fails for `a <= 0`.
    pub fn pareto(&self, a: f64) -> Result<f64, RandstateError> {
        if a <= 0.0 {
            return Err(RandstateError::param("a", a));
        }
        Ok(continuous::pareto(&mut self.lock().source, a))
    }

    /// Weibull deviate. Fails for `a < 0`; shape 0 yields 0 without drawing.
    pub fn weibull(&self, a: f64) -> Result<f64, RandstateError> {
        if a < 0.0 {
            return Err(RandstateError::param("a", a));
        }
        Ok(continuous::weibull(&mut self.lock().source, a))
    }

    /// Power-function deviate. Fails for `a <= 0`.
    pub fn power(&self, a: f64) -> Result<f64, RandstateError> {
        if a <= 0.0 {
            return Err(RandstateError::param("a", a));
        }
        Ok(continuous::power(&mut self.lock().source, a))
    }

    /// Student's t deviate. Fails for `df <= 0`.
    pub fn standard_t(&self, df: f64) -> Result<f64, RandstateError> {
        if df <= 0.0 {
            return Err(RandstateError::param("df", df));
        }
        let inner = &mut *self.lock();
        Ok(continuous::standard_t(
            &mut inner.source,
            &mut inner.gauss,
            df,
        ))
    }

    /// Standard Cauchy deviate.
    pub fn standard_cauchy(&self) -> f64 {
        let inner = &mut *self.lock();
        continuous::standard_cauchy(&mut inner.source, &mut inner.gauss)
    }

    /// Rayleigh deviate. Fails for `scale < 0`.
    pub fn rayleigh(&self, scale: f64) -> Result<f64, RandstateError> {
        if scale < 0.0 {
            return Err(RandstateError::param("scale", scale));
        }
        Ok(continuous::rayleigh(&mut self.lock().source, scale))
    }

    /// Log-normal deviate. Fails for `sigma < 0`.
    pub fn lognormal(&self, mean: f64, sigma: f64) -> Result<f64, RandstateError> {
        if sigma < 0.0 {
            return Err(RandstateError::param("sigma", sigma));
        }
        let inner = &mut *self.lock();
        Ok(continuous::lognormal(
            &mut inner.source,
            &mut inner.gauss,
            mean,
            sigma,
        ))
    }

    /// Binomial deviate. Fails for `n < 0` or `p` outside `[0, 1]` (NaN
    /// included, since the count sampler cannot propagate it).
    pub fn binomial(&self, n: i64, p: f64) -> Result<i64, RandstateError> {
        if n < 0 {
            return Err(RandstateError::param("n", n as f64));
        }
        if !(0.0..=1.0).contains(&p) {
            return Err(RandstateError::param("p", p));
        }
        let inner = &mut *self.lock();
        Ok(discrete::binomial(&mut inner.source, &mut inner.binomial, n, p))
    }

    /// Negative binomial deviate. Fails for `n <= 0` or `p` outside
    /// `(0, 1]`.
    pub fn negative_binomial(&self, n: f64, p: f64) -> Result<i64, RandstateError> {
        if !(n > 0.0) {
            return Err(RandstateError::param("n", n));
        }
        if !(p > 0.0 && p <= 1.0) {
            return Err(RandstateError::param("p", p));
        }
        let inner = &mut *self.lock();
        Ok(discrete::negative_binomial(
            &mut inner.source,
            &mut inner.gauss,
            n,
            p,
        ))
    }

    /// Poisson deviate. Fails for negative, NaN, or oversized means.
    pub fn poisson(&self, lam: f64) -> Result<i64, RandstateError> {
        if !(lam >= 0.0) || lam > POISSON_LAM_MAX {
            return Err(RandstateError::param("lam", lam));
        }
        Ok(randstate_core::kernels::poisson(&mut self.lock().source, lam))
    }

    /// Zipf deviate. Fails unless `a > 1`.
    pub fn zipf(&self, a: f64) -> Result<i64, RandstateError> {
        if !(a > 1.0) {
            return Err(RandstateError::param("a", a));
        }
        Ok(randstate_core::kernels::zipf(&mut self.lock().source, a))
    }

    /// Geometric deviate (trials until first success, support from 1).
    /// Fails unless `0 < p <= 1`.
    pub fn geometric(&self, p: f64) -> Result<i64, RandstateError> {
        if !(p > 0.0 && p <= 1.0) {
            return Err(RandstateError::param("p", p));
        }
        Ok(discrete::geometric(&mut self.lock().source, p))
    }

    /// Hypergeometric deviate. Fails for negative counts or a sample larger
    /// than the population.
    pub fn hypergeometric(&self, good: i64, bad: i64, sample: i64) -> Result<i64, RandstateError> {
        if good < 0 {
            return Err(RandstateError::param("good", good as f64));
        }
        if bad < 0 {
            return Err(RandstateError::param("bad", bad as f64));
        }
        if sample < 0 || sample > good + bad {
            return Err(RandstateError::param("sample", sample as f64));
        }
        Ok(discrete::hypergeometric(
            &mut self.lock().source,
            good,
            bad,
            sample,
        ))
    }

    /// Log-series deviate. Fails unless `0 < p < 1`.
    pub fn logseries(&self, p: f64) -> Result<i64, RandstateError> {
        if !(p > 0.0 && p < 1.0) {
            return Err(RandstateError::param("p", p));
        }
        Ok(discrete::logseries(&mut self.lock().source, p))
    }

    /// Multinomial counts over `pvals` for `n` trials.
    ///
    /// Fails for `n < 0`, for probabilities outside `[0, 1]` (NaN included),
    /// or when all but the last category carry more than unit mass.
    pub fn multinomial(&self, n: i64, pvals: &[f64]) -> Result<Vec<i64>, RandstateError> {
        if n < 0 {
            return Err(RandstateError::param("n", n as f64));
        }
        if pvals.is_empty() || pvals.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(RandstateError::InvalidProbabilities);
        }
        let head: f64 = pvals[..pvals.len() - 1].iter().sum();
        if head > 1.0 + 1e-12 {
            return Err(RandstateError::InvalidProbabilities);
        }
        let mut out = vec![0i64; pvals.len()];
        let inner = &mut *self.lock();
        discrete::multinomial(&mut inner.source, &mut inner.binomial, n, pvals, &mut out);
        Ok(out)
    }
}
