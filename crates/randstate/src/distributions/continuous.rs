//! Continuous legacy samplers.
//!
//! The Gaussian polar sampler is the root of most of this module: gamma above
//! shape 1, the normal family, Wald, Student's t and Cauchy all consume
//! deviates through it, and all of them therefore share one [`GaussCache`]
//! so the spare polar partner is handed out in the reference order.

use std::f64::consts::PI;

use randstate_core::{ieee, kernels, BitSource};

/// Spare Gaussian deviate left over from the polar method.
///
/// The polar transform produces deviates in pairs; the unreturned partner is
/// parked here and served by the next call without touching the engine. An
/// empty cache is the normal cold-start state, never an error.
#[derive(Debug, Clone, Default)]
pub struct GaussCache {
    value: f64,
    valid: bool,
}

impl GaussCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a spare deviate is parked.
    pub fn is_primed(&self) -> bool {
        self.valid
    }
}

/// Standard Gaussian deviate by the polar (Marsaglia) method.
///
/// An accepted iteration consumes exactly two doubles and yields two
/// deviates; the partner is cached and the next call consumes nothing.
pub fn gauss<S: BitSource + ?Sized>(source: &mut S, cache: &mut GaussCache) -> f64 {
    if cache.valid {
        let temp = cache.value;
        cache.valid = false;
        cache.value = 0.0;
        return temp;
    }
    loop {
        let x1 = 2.0 * source.next_f64() - 1.0;
        let x2 = 2.0 * source.next_f64() - 1.0;
        let r2 = x1 * x1 + x2 * x2;
        if r2 >= 1.0 || r2 == 0.0 {
            continue;
        }
        let f = (-2.0 * r2.ln() / r2).sqrt();
        cache.value = f * x1;
        cache.valid = true;
        return f * x2;
    }
}

/// Unit-rate exponential deviate, `-log(1 - U)` with `U` in `[0, 1)`.
pub fn standard_exponential<S: BitSource + ?Sized>(source: &mut S) -> f64 {
    -(1.0 - source.next_f64()).ln()
}

/// Exponential deviate with the given scale.
pub fn exponential<S: BitSource + ?Sized>(source: &mut S, scale: f64) -> f64 {
    scale * standard_exponential(source)
}

/// Standard gamma deviate.
///
/// Dispatch matches the reference exactly: shape 1 is an exponential, shape 0
/// is an exact zero without drawing, shapes below 1 use the combined
/// uniform/exponential rejection, shapes above 1 use Marsaglia-Tsang with
/// Gaussian proposals (hence the cache).
pub fn standard_gamma<S: BitSource + ?Sized>(
    source: &mut S,
    cache: &mut GaussCache,
    shape: f64,
) -> f64 {
    if shape == 1.0 {
        standard_exponential(source)
    } else if shape == 0.0 {
        0.0
    } else if shape < 1.0 {
        loop {
            let u = source.next_f64();
            let v = standard_exponential(source);
            if u <= 1.0 - shape {
                let x = u.powf(1.0 / shape);
                if x <= v {
                    return x;
                }
            } else {
                let y = -((1.0 - u) / shape).ln();
                let x = (1.0 - shape + shape * y).powf(1.0 / shape);
                if x <= v + y {
                    return x;
                }
            }
        }
    } else {
        let b = shape - 1.0 / 3.0;
        let c = 1.0 / (9.0 * b).sqrt();
        loop {
            let mut x;
            let mut v;
            loop {
                x = gauss(source, cache);
                v = 1.0 + c * x;
                // NaN must fall through here, not spin.
                if !(v <= 0.0) {
                    break;
                }
            }
            v = v * v * v;
            let u = source.next_f64();
            if u < 1.0 - 0.0331 * (x * x) * (x * x) {
                return b * v;
            }
            if u.ln() < 0.5 * x * x + b * (1.0 - v + v.ln()) {
                return b * v;
            }
        }
    }
}

/// Gamma deviate with shape and scale.
pub fn gamma<S: BitSource + ?Sized>(
    source: &mut S,
    cache: &mut GaussCache,
    shape: f64,
    scale: f64,
) -> f64 {
    scale * standard_gamma(source, cache, shape)
}

/// Beta deviate.
///
/// Johnk's rejection when both shapes are at most 1, with the log-domain
/// rescue when the accepted pair underflows to `0 / 0`; the gamma ratio
/// otherwise. Callers guarantee `a > 0` and `b > 0`.
pub fn beta<S: BitSource + ?Sized>(source: &mut S, cache: &mut GaussCache, a: f64, b: f64) -> f64 {
    if a <= 1.0 && b <= 1.0 {
        loop {
            let u = source.next_f64();
            let v = source.next_f64();
            let x = u.powf(1.0 / a);
            let y = v.powf(1.0 / b);
            if x + y <= 1.0 {
                if x + y > 0.0 {
                    return x / (x + y);
                }
                let mut log_x = u.ln() / a;
                let mut log_y = v.ln() / b;
                let log_m = if log_x > log_y { log_x } else { log_y };
                log_x -= log_m;
                log_y -= log_m;
                return (log_x - (log_x.exp() + log_y.exp()).ln()).exp();
            }
        }
    } else {
        let ga = standard_gamma(source, cache, a);
        let gb = standard_gamma(source, cache, b);
        ga / (ga + gb)
    }
}

/// Pareto deviate with shape `a > 0` (Lomax form, support from 0).
pub fn pareto<S: BitSource + ?Sized>(source: &mut S, a: f64) -> f64 {
    (standard_exponential(source) / a).exp() - 1.0
}

/// Weibull deviate with shape `a`; shape 0 is an exact zero without drawing.
pub fn weibull<S: BitSource + ?Sized>(source: &mut S, a: f64) -> f64 {
    if a == 0.0 {
        return 0.0;
    }
    standard_exponential(source).powf(1.0 / a)
}

/// Power-function deviate with exponent `a > 0`.
pub fn power<S: BitSource + ?Sized>(source: &mut S, a: f64) -> f64 {
    (1.0 - (-standard_exponential(source)).exp()).powf(1.0 / a)
}

/// Chi-square deviate with `df` degrees of freedom.
pub fn chisquare<S: BitSource + ?Sized>(source: &mut S, cache: &mut GaussCache, df: f64) -> f64 {
    2.0 * standard_gamma(source, cache, df / 2.0)
}

/// Noncentral chi-square deviate.
///
/// The `df <= 1` branch samples through a Poisson mixture and then applies
/// the reference's post-hoc NaN guard, so a NaN noncentrality consumes the
/// same draws the numeric path would.
pub fn noncentral_chisquare<S: BitSource + ?Sized>(
    source: &mut S,
    cache: &mut GaussCache,
    df: f64,
    nonc: f64,
) -> f64 {
    if nonc == 0.0 {
        return chisquare(source, cache, df);
    }
    if 1.0 < df {
        let chi2 = chisquare(source, cache, df - 1.0);
        let n = gauss(source, cache) + nonc.sqrt();
        chi2 + n * n
    } else {
        let i = kernels::poisson(source, nonc / 2.0);
        let out = chisquare(source, cache, df + 2.0 * i as f64);
        if ieee::isnan(nonc) {
            ieee::nan()
        } else {
            out
        }
    }
}

/// F deviate as a ratio of scaled chi-squares.
pub fn f<S: BitSource + ?Sized>(
    source: &mut S,
    cache: &mut GaussCache,
    dfnum: f64,
    dfden: f64,
) -> f64 {
    (chisquare(source, cache, dfnum) * dfden) / (chisquare(source, cache, dfden) * dfnum)
}

/// Noncentral F deviate.
pub fn noncentral_f<S: BitSource + ?Sized>(
    source: &mut S,
    cache: &mut GaussCache,
    dfnum: f64,
    dfden: f64,
    nonc: f64,
) -> f64 {
    let t = noncentral_chisquare(source, cache, dfnum, nonc) * dfden;
    t / (chisquare(source, cache, dfden) * dfnum)
}

/// Wald (inverse Gaussian) deviate. Callers guarantee positive mean and scale.
pub fn wald<S: BitSource + ?Sized>(
    source: &mut S,
    cache: &mut GaussCache,
    mean: f64,
    scale: f64,
) -> f64 {
    let mu_2l = mean / (2.0 * scale);
    let mut y = gauss(source, cache);
    y = mean * y * y;
    let x = mean + mu_2l * (y - (4.0 * scale * y + y * y).sqrt());
    let u = source.next_f64();
    if u <= mean / (mean + x) {
        x
    } else {
        mean * mean / x
    }
}

/// Gaussian deviate with location and scale.
pub fn normal<S: BitSource + ?Sized>(
    source: &mut S,
    cache: &mut GaussCache,
    loc: f64,
    scale: f64,
) -> f64 {
    loc + scale * gauss(source, cache)
}

/// Log-normal deviate.
pub fn lognormal<S: BitSource + ?Sized>(
    source: &mut S,
    cache: &mut GaussCache,
    mean: f64,
    sigma: f64,
) -> f64 {
    normal(source, cache, mean, sigma).exp()
}

/// Student's t deviate with `df > 0` degrees of freedom.
pub fn standard_t<S: BitSource + ?Sized>(source: &mut S, cache: &mut GaussCache, df: f64) -> f64 {
    let num = gauss(source, cache);
    let denom = standard_gamma(source, cache, df / 2.0);
    (df / 2.0).sqrt() * num / denom.sqrt()
}

/// Standard Cauchy deviate as a ratio of two Gaussians.
pub fn standard_cauchy<S: BitSource + ?Sized>(source: &mut S, cache: &mut GaussCache) -> f64 {
    gauss(source, cache) / gauss(source, cache)
}

/// Rayleigh deviate with the given mode.
pub fn rayleigh<S: BitSource + ?Sized>(source: &mut S, mode: f64) -> f64 {
    mode * (-2.0 * ieee::log1p(-source.next_f64())).sqrt()
}

/// Von Mises deviate on the circle, folded into `(-pi, pi]`.
///
/// A NaN concentration returns NaN before any draw. Below `1e-8` the
/// distribution is indistinguishable from uniform and `mu` is ignored, as in
/// the reference. Between `1e-8` and `1e-5` the envelope parameter comes from
/// a second-order Taylor expansion; above that, from the closed form.
pub fn vonmises<S: BitSource + ?Sized>(source: &mut S, mu: f64, kappa: f64) -> f64 {
    if ieee::isnan(kappa) {
        return ieee::nan();
    }
    if kappa < 1e-8 {
        return PI * (2.0 * source.next_f64() - 1.0);
    }
    let s = if kappa < 1e-5 {
        1.0 / kappa + kappa
    } else {
        let r = 1.0 + (1.0 + 4.0 * kappa * kappa).sqrt();
        let rho = (r - (2.0 * r).sqrt()) / (2.0 * kappa);
        (1.0 + rho * rho) / (2.0 * rho)
    };

    let mut w;
    loop {
        let u = source.next_f64();
        let z = (PI * u).cos();
        w = (1.0 + s * z) / (s + z);
        let y = kappa * (s - w);
        let v = source.next_f64();
        // V == 0.0 is fine: Y >= 0 always accepts and Y < 0 always rejects.
        if y * (2.0 - y) - v >= 0.0 || (y / v).ln() + 1.0 - y >= 0.0 {
            break;
        }
    }

    let u = source.next_f64();
    let mut result = w.acos();
    if u < 0.5 {
        result = -result;
    }
    result += mu;
    let neg = result < 0.0;
    let mut modulus = result.abs();
    modulus = (modulus + PI) % (2.0 * PI) - PI;
    if neg {
        modulus = -modulus;
    }
    modulus
}
