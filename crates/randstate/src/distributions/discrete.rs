//! Discrete legacy samplers.
//!
//! Binomial sampling carries the reference's scratch cache: the setup
//! constants for BTPE or inversion are recomputed only when `(n, p)` changes,
//! and reusing them is output-neutral because setup consumes no draws.

use randstate_core::{ieee, kernels, BitSource};

use super::continuous::{self, GaussCache};

/// Setup constants for the BTPE triangle/parallelogram/tail envelope.
#[derive(Debug, Clone, Copy)]
struct BtpeParams {
    r: f64,
    q: f64,
    fm: f64,
    m: i64,
    p1: f64,
    xm: f64,
    xl: f64,
    xr: f64,
    c: f64,
    laml: f64,
    lamr: f64,
    p2: f64,
    p3: f64,
    p4: f64,
}

/// Setup constants for the sequential-search inversion sampler.
#[derive(Debug, Clone, Copy)]
struct InversionParams {
    q: f64,
    qn: f64,
    bound: i64,
}

#[derive(Debug, Clone, Copy)]
enum Params {
    Btpe(BtpeParams),
    Inversion(InversionParams),
}

/// Binomial scratch cache keyed on `(n, p)`.
///
/// Cold-start absence is the normal state. The cache never changes which
/// values are drawn, only whether the setup arithmetic is repeated.
#[derive(Debug, Clone, Default)]
pub struct BinomialCache {
    key: Option<(i64, f64)>,
    params: Option<Params>,
}

impl BinomialCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

fn btpe_setup(n: i64, p: f64) -> BtpeParams {
    let r = p.min(1.0 - p);
    let q = 1.0 - r;
    let fm = n as f64 * r + r;
    let m = fm.floor() as i64;
    let p1 = (2.195 * (n as f64 * r * q).sqrt() - 4.6 * q).floor() + 0.5;
    let xm = m as f64 + 0.5;
    let xl = xm - p1;
    let xr = xm + p1;
    let c = 0.134 + 20.5 / (15.3 + m as f64);
    let mut a = (fm - xl) / (fm - xl * r);
    let laml = a * (1.0 + a / 2.0);
    a = (xr - fm) / (xr * q);
    let lamr = a * (1.0 + a / 2.0);
    let p2 = p1 * (1.0 + 2.0 * c);
    let p3 = p2 + c / laml;
    let p4 = p3 + c / lamr;
    BtpeParams {
        r,
        q,
        fm,
        m,
        p1,
        xm,
        xl,
        xr,
        c,
        laml,
        lamr,
        p2,
        p3,
        p4,
    }
}

/// The 13680-series correction term of BTPE's final acceptance test.
#[inline]
fn btpe_series(t2: f64) -> f64 {
    13680. - (462. - (132. - (99. - 140. / t2) / t2) / t2) / t2
}

/// Binomial deviate by BTPE. Callers guarantee `p <= 0.5` and `n * p > 30`.
fn binomial_btpe<S: BitSource + ?Sized>(
    source: &mut S,
    cache: &mut BinomialCache,
    n: i64,
    p: f64,
) -> i64 {
    let params = match (cache.key, cache.params) {
        (Some(key), Some(Params::Btpe(params))) if key == (n, p) => params,
        _ => {
            let params = btpe_setup(n, p);
            cache.key = Some((n, p));
            cache.params = Some(Params::Btpe(params));
            params
        }
    };
    let BtpeParams {
        r,
        q,
        m,
        p1,
        xm,
        xl,
        xr,
        c,
        laml,
        lamr,
        p2,
        p3,
        p4,
        ..
    } = params;
    let nrq = n as f64 * r * q;

    loop {
        let u = source.next_f64() * p4;
        let mut v = source.next_f64();

        let y: i64;
        if u <= p1 {
            // Triangular central region accepts without any further test.
            return (xm - p1 * v + u).floor() as i64;
        } else if u <= p2 {
            let x = xl + (u - p1) / c;
            v = v * c + 1.0 - (m as f64 - x + 0.5).abs() / p1;
            if v > 1.0 {
                continue;
            }
            y = x.floor() as i64;
        } else if u <= p3 {
            // v == 0.0 makes the cast below undefined in the reference, so
            // it rejects.
            y = (xl + v.ln() / laml).floor() as i64;
            if y < 0 || v == 0.0 {
                continue;
            }
            v = v * (u - p2) * laml;
        } else {
            y = (xr - v.ln() / lamr).floor() as i64;
            if y > n || v == 0.0 {
                continue;
            }
            v = v * (u - p3) * lamr;
        }

        let k = (y - m).abs();
        if !(k > 20 && (k as f64) < nrq / 2.0 - 1.0) {
            // Explicit product evaluation of the ratio of binomial terms.
            let s = r / q;
            let a = s * (n + 1) as f64;
            let mut f_ratio = 1.0;
            if m < y {
                for i in (m + 1)..=y {
                    f_ratio *= a / i as f64 - s;
                }
            } else if m > y {
                for i in (y + 1)..=m {
                    f_ratio /= a / i as f64 - s;
                }
            }
            if v > f_ratio {
                continue;
            }
            return y;
        }

        // Squeeze on log(v) before the expensive final test.
        let kf = k as f64;
        let rho = (kf / nrq) * ((kf * (kf / 3.0 + 0.625) + 0.16666666666666666) / nrq + 0.5);
        let t = -kf * kf / (2.0 * nrq);
        // log(0.0) is fine here.
        let a_log = v.ln();
        if a_log < t - rho {
            return y;
        }
        if a_log > t + rho {
            continue;
        }

        let x1 = (y + 1) as f64;
        let f1 = (m + 1) as f64;
        let z = (n + 1 - m) as f64;
        let w = (n - y + 1) as f64;
        let x2 = x1 * x1;
        let f2 = f1 * f1;
        let z2 = z * z;
        let w2 = w * w;
        if a_log
            > xm * (f1 / x1).ln()
                + ((n - m) as f64 + 0.5) * (z / w).ln()
                + ((y - m) as f64) * (w * r / (x1 * q)).ln()
                + btpe_series(f2) / f1 / 166320.
                + btpe_series(z2) / z / 166320.
                + btpe_series(x2) / x1 / 166320.
                + btpe_series(w2) / w / 166320.
        {
            continue;
        }
        return y;
    }
}

/// Binomial deviate by sequential-search inversion. Callers guarantee
/// `p <= 0.5` and `n * p <= 30`.
fn binomial_inversion<S: BitSource + ?Sized>(
    source: &mut S,
    cache: &mut BinomialCache,
    n: i64,
    p: f64,
) -> i64 {
    let params = match (cache.key, cache.params) {
        (Some(key), Some(Params::Inversion(params))) if key == (n, p) => params,
        _ => {
            let q = 1.0 - p;
            let np = n as f64 * p;
            let params = InversionParams {
                q,
                qn: (n as f64 * q.ln()).exp(),
                bound: (n as f64).min(np + 10.0 * (np * q + 1.0).sqrt()) as i64,
            };
            cache.key = Some((n, p));
            cache.params = Some(Params::Inversion(params));
            params
        }
    };
    let InversionParams { q, qn, bound } = params;

    let mut x: i64 = 0;
    let mut px = qn;
    let mut u = source.next_f64();
    while u > px {
        x += 1;
        if x > bound {
            // Restart rather than walk past the plausible support.
            x = 0;
            px = qn;
            u = source.next_f64();
        } else {
            u -= px;
            px = ((n - x + 1) as f64 * p * px) / (x as f64 * q);
        }
    }
    x
}

/// Binomial deviate with the legacy dispatch.
///
/// The sampler always runs on `min(p, 1 - p)`: inversion when the expected
/// count is at most 30, BTPE otherwise, with the result reflected to
/// `n - X` for `p > 0.5`. Callers guarantee `n >= 0` and `p` in `[0, 1]`.
pub fn binomial<S: BitSource + ?Sized>(
    source: &mut S,
    cache: &mut BinomialCache,
    n: i64,
    p: f64,
) -> i64 {
    if p <= 0.5 {
        if p * n as f64 <= 30.0 {
            binomial_inversion(source, cache, n, p)
        } else {
            binomial_btpe(source, cache, n, p)
        }
    } else {
        let q = 1.0 - p;
        if q * n as f64 <= 30.0 {
            n - binomial_inversion(source, cache, n, q)
        } else {
            n - binomial_btpe(source, cache, n, q)
        }
    }
}

/// Hypergeometric deviate by inversion, for small sample counts.
fn hypergeometric_hyp<S: BitSource + ?Sized>(
    source: &mut S,
    good: i64,
    bad: i64,
    sample: i64,
) -> i64 {
    let d1 = bad + good - sample;
    let d2 = bad.min(good) as f64;

    let mut y = d2;
    let mut k = sample;
    while y > 0.0 {
        let u = source.next_f64();
        y -= (u + y / (d1 + k) as f64).floor();
        k -= 1;
        if k == 0 {
            break;
        }
    }
    let mut z = (d2 - y) as i64;
    if good > bad {
        z = sample - z;
    }
    z
}

// 2 * sqrt(2 / e)
const HRUA_D1: f64 = 1.7155277699214135;
// 3 - 2 * sqrt(3 / e)
const HRUA_D2: f64 = 0.8989161620588988;

/// Hypergeometric deviate by the HRUA rejection method.
fn hypergeometric_hrua<S: BitSource + ?Sized>(
    source: &mut S,
    good: i64,
    bad: i64,
    sample: i64,
) -> i64 {
    let mingoodbad = good.min(bad);
    let popsize = good + bad;
    let maxgoodbad = good.max(bad);
    let m = sample.min(popsize - sample);
    let d4 = mingoodbad as f64 / popsize as f64;
    let d5 = 1.0 - d4;
    let d6 = m as f64 * d4 + 0.5;
    let d7 = (((popsize - m) * sample) as f64 * d4 * d5 / (popsize - 1) as f64 + 0.5).sqrt();
    let d8 = HRUA_D1 * d7 + HRUA_D2;
    let d9 = ((m + 1) as f64 * (mingoodbad + 1) as f64 / (popsize + 2) as f64).floor() as i64;
    let d10 = kernels::loggam((d9 + 1) as f64)
        + kernels::loggam((mingoodbad - d9 + 1) as f64)
        + kernels::loggam((m - d9 + 1) as f64)
        + kernels::loggam((maxgoodbad - m + d9 + 1) as f64);
    // 16 for 16-decimal-digit precision in D1 and D2.
    let d11 = ((m.min(mingoodbad) + 1) as f64).min((d6 + 16.0 * d7).floor());

    let mut z;
    loop {
        let x = source.next_f64();
        let y = source.next_f64();
        let w = d6 + d8 * (y - 0.5) / x;

        if w < 0.0 || w >= d11 {
            continue;
        }

        z = w.floor() as i64;
        let t = d10
            - (kernels::loggam((z + 1) as f64)
                + kernels::loggam((mingoodbad - z + 1) as f64)
                + kernels::loggam((m - z + 1) as f64)
                + kernels::loggam((maxgoodbad - m + z + 1) as f64));

        if x * (4.0 - x) - 3.0 <= t {
            break;
        }
        if x * (x - t) >= 1.0 {
            continue;
        }
        // log(0.0) is ok here, always accepts.
        if 2.0 * x.ln() <= t {
            break;
        }
    }

    if good > bad {
        z = m - z;
    }
    if m < sample {
        z = good - z;
    }
    z
}

/// Hypergeometric deviate: inversion for samples of at most 10, HRUA above.
///
/// Callers guarantee non-negative counts with `sample <= good + bad`.
pub fn hypergeometric<S: BitSource + ?Sized>(
    source: &mut S,
    good: i64,
    bad: i64,
    sample: i64,
) -> i64 {
    if sample > 10 {
        hypergeometric_hrua(source, good, bad, sample)
    } else if sample > 0 {
        hypergeometric_hyp(source, good, bad, sample)
    } else {
        0
    }
}

fn geometric_inversion<S: BitSource + ?Sized>(source: &mut S, p: f64) -> i64 {
    (ieee::log1p(-source.next_f64()) / (1.0 - p).ln()).ceil() as i64
}

/// Geometric deviate: sequential search for `p >= 1/3`, inversion below.
///
/// Callers guarantee `0 < p <= 1`.
pub fn geometric<S: BitSource + ?Sized>(source: &mut S, p: f64) -> i64 {
    if p >= 0.333333333333333333333333 {
        kernels::geometric_search(source, p)
    } else {
        geometric_inversion(source, p)
    }
}

/// Log-series deviate. Callers guarantee `0 < p < 1`.
pub fn logseries<S: BitSource + ?Sized>(source: &mut S, p: f64) -> i64 {
    let r = (1.0 - p).ln();

    loop {
        let v = source.next_f64();
        if v >= p {
            return 1;
        }
        let u = source.next_f64();
        let q = 1.0 - (r * u).exp();
        if v <= q * q {
            let result = (1.0 + v.ln() / q.ln()).floor() as i64;
            // A draw of exactly zero or a sub-1 result restarts.
            if result < 1 || v == 0.0 {
                continue;
            }
            return result;
        }
        if v >= q {
            return 1;
        }
        return 2;
    }
}

/// Negative binomial deviate as a gamma-mixed Poisson.
///
/// Callers guarantee `n > 0` and `0 < p <= 1`.
pub fn negative_binomial<S: BitSource + ?Sized>(
    source: &mut S,
    cache: &mut GaussCache,
    n: f64,
    p: f64,
) -> i64 {
    let y = continuous::gamma(source, cache, n, (1.0 - p) / p);
    kernels::poisson(source, y)
}

/// Multinomial counts: `n` trials split over `pvals` into `out`.
///
/// Sampled as a chain of binomials over the remaining mass, so the binomial
/// cache carries across categories. Callers guarantee equal slice lengths
/// and probabilities summing to at most 1.
pub fn multinomial<S: BitSource + ?Sized>(
    source: &mut S,
    cache: &mut BinomialCache,
    n: i64,
    pvals: &[f64],
    out: &mut [i64],
) {
    out.fill(0);
    let d = pvals.len();
    let mut remaining_p = 1.0;
    let mut dn = n;
    for j in 0..d.saturating_sub(1) {
        out[j] = binomial(source, cache, dn, pvals[j] / remaining_p);
        dn -= out[j];
        if dn <= 0 {
            break;
        }
        remaining_p -= pvals[j];
    }
    if dn > 0 && d > 0 {
        out[d - 1] = dn;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Script {
        values: Vec<f64>,
        cursor: usize,
    }

    impl Script {
        fn new(values: &[f64]) -> Self {
            Self {
                values: values.to_vec(),
                cursor: 0,
            }
        }
    }

    impl BitSource for Script {
        fn next_u64(&mut self) -> u64 {
            panic!("unexpected u64 draw");
        }

        fn next_u32(&mut self) -> u32 {
            panic!("unexpected u32 draw");
        }

        fn next_f64(&mut self) -> f64 {
            let v = self.values[self.cursor];
            self.cursor += 1;
            v
        }

        fn next_raw(&mut self) -> u64 {
            panic!("unexpected raw draw");
        }
    }

    struct Lcg(u64);

    impl BitSource for Lcg {
        fn next_u64(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.0
        }

        fn next_u32(&mut self) -> u32 {
            (self.next_u64() >> 32) as u32
        }

        fn next_f64(&mut self) -> f64 {
            (self.next_u64() >> 11) as f64 * (1.0 / 9007199254740992.0)
        }

        fn next_raw(&mut self) -> u64 {
            self.next_u64()
        }
    }

    #[test]
    fn binomial_inversion_zero_steps() {
        // n = 4, p = 0.25: qn = 0.75^4 = 0.3164; u = 0.3 stays below it.
        let mut src = Script::new(&[0.3]);
        let mut cache = BinomialCache::new();
        assert_eq!(binomial(&mut src, &mut cache, 4, 0.25), 0);
        assert_eq!(src.cursor, 1);
    }

    #[test]
    fn binomial_inversion_steps_once() {
        // n = 4, p = 0.5: qn = 0.0625; u = 0.3 steps past k = 0, the next
        // pmf term 0.25 covers the remainder.
        let mut src = Script::new(&[0.3]);
        let mut cache = BinomialCache::new();
        assert_eq!(binomial(&mut src, &mut cache, 4, 0.5), 1);
    }

    #[test]
    fn binomial_reflects_large_p() {
        // p = 0.8 runs inversion on q = 0.2: qn = 0.8^10 = 0.107; u = 0.05
        // yields X = 0, reflected to n.
        let mut src = Script::new(&[0.05]);
        let mut cache = BinomialCache::new();
        assert_eq!(binomial(&mut src, &mut cache, 10, 0.8), 10);
    }

    #[test]
    fn binomial_btpe_triangle_accept() {
        // n = 100, p = 0.5 dispatches to BTPE (np = 50 > 30). With both
        // uniforms at 0.3: u = 0.3 * p4 = 5.6498 lands in the triangular
        // region (p1 = 8.5), y = floor(50.5 - 8.5 * 0.3 + 5.6498) = 53,
        // accepted unconditionally after exactly two draws.
        let mut src = Script::new(&[0.3, 0.3]);
        let mut cache = BinomialCache::new();
        assert_eq!(binomial(&mut src, &mut cache, 100, 0.5), 53);
        assert_eq!(src.cursor, 2);
    }

    #[test]
    fn binomial_btpe_cache_reuse_is_output_neutral() {
        let mut src = Script::new(&[0.3, 0.3, 0.3, 0.3]);
        let mut cache = BinomialCache::new();
        let a = binomial(&mut src, &mut cache, 100, 0.5);
        let b = binomial(&mut src, &mut cache, 100, 0.5);
        assert_eq!(a, b);
        assert_eq!(src.cursor, 4);
    }

    #[test]
    fn binomial_btpe_stays_in_support() {
        let mut src = Lcg(0xDEAD_BEEF);
        let mut cache = BinomialCache::new();
        for _ in 0..500 {
            let x = binomial(&mut src, &mut cache, 1_000, 0.37);
            assert!((0..=1_000).contains(&x));
        }
    }

    #[test]
    fn binomial_mean_is_plausible() {
        let mut src = Lcg(7);
        let mut cache = BinomialCache::new();
        let n = 2_000;
        let total: i64 = (0..n)
            .map(|_| binomial(&mut src, &mut cache, 100, 0.5))
            .sum();
        let mean = total as f64 / n as f64;
        // sigma = 5, standard error ~0.11; 49..51 is a 9-sigma window.
        assert!((49.0..51.0).contains(&mean), "mean {mean}");
    }

    #[test]
    fn hypergeometric_small_sample_trace() {
        // good = bad = 5, sample = 3, all uniforms 0.5: y walks 5, 4, 4
        // and the count of removed goods is 2.
        let mut src = Script::new(&[0.5, 0.5, 0.5]);
        assert_eq!(hypergeometric(&mut src, 5, 5, 3), 2);
        assert_eq!(src.cursor, 3);
    }

    #[test]
    fn hypergeometric_zero_sample_draws_nothing() {
        let mut src = Script::new(&[]);
        assert_eq!(hypergeometric(&mut src, 5, 5, 0), 0);
    }

    #[test]
    fn hypergeometric_hrua_stays_in_support() {
        let mut src = Lcg(42);
        for _ in 0..500 {
            let x = hypergeometric(&mut src, 60, 40, 30);
            // At most all 30 draws are good, at least 30 - 40 (never
            // negative here).
            assert!((0..=30).contains(&x));
        }
    }

    #[test]
    fn hypergeometric_hrua_sample_beyond_half_population() {
        let mut src = Lcg(43);
        for _ in 0..200 {
            let x = hypergeometric(&mut src, 20, 15, 30);
            // 30 draws from 35: at least 15 goods, at most all 20.
            assert!((15..=20).contains(&x));
        }
    }

    #[test]
    fn geometric_dispatch_inversion() {
        // p = 0.1 < 1/3: ceil(log1p(-0.5) / ln(0.9)) = ceil(6.579) = 7.
        let mut src = Script::new(&[0.5]);
        assert_eq!(geometric(&mut src, 0.1), 7);
    }

    #[test]
    fn geometric_dispatch_search() {
        // p = 0.5 >= 1/3 goes through sequential search.
        let mut src = Script::new(&[0.8]);
        assert_eq!(geometric(&mut src, 0.5), 3);
    }

    #[test]
    fn logseries_immediate_one() {
        let mut src = Script::new(&[0.6]);
        assert_eq!(logseries(&mut src, 0.5), 1);
    }

    #[test]
    fn logseries_branch_values() {
        // v = 0.3, u = 0.5: q = 0.2929, q^2 < v < q fails the square test
        // but v >= q, so 1.
        let mut src = Script::new(&[0.3, 0.5]);
        assert_eq!(logseries(&mut src, 0.5), 1);
        // v = 0.2 sits between q^2 and q: 2.
        let mut src = Script::new(&[0.2, 0.5]);
        assert_eq!(logseries(&mut src, 0.5), 2);
        // v = 0.05 <= q^2: floor(1 + ln v / ln q) = 3.
        let mut src = Script::new(&[0.05, 0.5]);
        assert_eq!(logseries(&mut src, 0.5), 3);
    }

    #[test]
    fn negative_binomial_nonnegative() {
        let mut src = Lcg(11);
        let mut cache = GaussCache::new();
        for _ in 0..200 {
            assert!(negative_binomial(&mut src, &mut cache, 5.0, 0.4) >= 0);
        }
    }

    #[test]
    fn multinomial_counts_sum_to_n() {
        let mut src = Lcg(13);
        let mut cache = BinomialCache::new();
        let pvals = [0.2, 0.3, 0.5];
        let mut out = [0i64; 3];
        for _ in 0..100 {
            multinomial(&mut src, &mut cache, 10, &pvals, &mut out);
            assert_eq!(out.iter().sum::<i64>(), 10);
            assert!(out.iter().all(|&c| c >= 0));
        }
    }

    #[test]
    fn multinomial_degenerate_mass_fills_first_cell() {
        let mut src = Script::new(&[0.5]);
        let mut cache = BinomialCache::new();
        let mut out = [0i64; 2];
        // p = [1, 0]: the first binomial runs at p = 1 and takes every
        // trial, the tail cell gets nothing.
        multinomial(&mut src, &mut cache, 7, &[1.0, 0.0], &mut out);
        assert_eq!(out, [7, 0]);
    }

    #[test]
    fn inversion_restart_path_terminates() {
        // Extreme u close to 1 forces walks past the bound and restarts;
        // the sampler must still terminate with in-range output.
        let mut src = Script::new(&[1.0 - 1e-16, 0.5]);
        let mut cache = BinomialCache::new();
        let x = binomial(&mut src, &mut cache, 5, 0.1);
        assert!((0..=5).contains(&x));
    }
}
