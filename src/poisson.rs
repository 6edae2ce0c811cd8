use tinyrand::Rand;

/// Upper bound on a single sampled count.
const MAX_SAMPLE: u16 = u16::MAX;

/// Probability that a Poisson(`mean`) variate exceeds `line`, i.e., `1 - CDF(floor(line))`.
pub fn over_prob(mean: f64, line: f64) -> f64 {
    if mean <= 0.0 || line < 0.0 {
        return if line < 0.0 { 1.0 } else { 0.0 };
    }
    let k = line.floor() as u64;
    let mut prob = f64::exp(-mean);
    let mut cdf = prob;
    for i in 1..=k {
        prob *= mean / i as f64;
        cdf += prob;
    }
    (1.0 - cdf).clamp(0.0, 1.0)
}

/// Draws one Poisson(`lambda`) variate by sequential inversion, consuming exactly one random
/// number per draw.
#[inline]
pub fn sample(lambda: f64, rand: &mut impl Rand) -> u16 {
    let random = random_f64(rand);
    let mut k = 0;
    let mut prob = f64::exp(-lambda);
    let mut cdf = prob;
    while cdf < random && k < MAX_SAMPLE {
        k += 1;
        prob *= lambda / k as f64;
        if prob == 0.0 {
            break;
        }
        cdf += prob;
    }
    k
}

#[inline]
fn random_f64(rand: &mut impl Rand) -> f64 {
    rand.next_u64() as f64 / u64::MAX as f64
}
