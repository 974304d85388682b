
use crate::error::{PipelineError, Result};

use rand::Rng;


/// Upper end of the integer domain the cumulative table is scaled onto.
pub const DOMAIN: u64 = 100_000_000;



/// Weighted draws over vocabulary ids, `P(i) ~ count[i] ^ exponent`.
pub struct NegativeSampler {
    cumulative: Vec<u64>,
}

impl NegativeSampler {

    pub fn new(counts: &[u64], exponent: f64) -> Result<NegativeSampler> {

        if !exponent.is_finite() || exponent < 0.0 {
            return Err(PipelineError::config("ns_exponent", format!("{} is not a finite non-negative number", exponent)));
        }
        if counts.len() <= 1 {
            return Err(PipelineError::Sampling(format!(
                "vocabulary holds {} word(s), excluding one leaves nothing to draw", counts.len()
            )));
        }

        let cumulative = NegativeSampler::cumulative_table(counts, exponent);

        // every draw excludes one id, so at least two ids need a slice of the domain
        let reachable = (0..cumulative.len()).filter(|i| NegativeSampler::width(&cumulative, *i) > 0).count();
        if reachable < 2 {
            return Err(PipelineError::Sampling(format!(
                "only {} of {} ids keep a non-empty share of the distribution", reachable, counts.len()
            )));
        }

        Ok(NegativeSampler { cumulative })
    }

    fn cumulative_table(counts: &[u64], exponent: f64) -> Vec<u64> {

        let weights: Vec<f64> = counts.iter().map(|c| (*c as f64).powf(exponent)).collect();
        let z: f64 = weights.iter().sum();

        let mut table = Vec::with_capacity(weights.len());
        let mut acc = 0.0_f64;
        for w in weights {
            acc += w;
            let scaled = (DOMAIN as f64 * acc / z).round() as u64;
            table.push(scaled.min(DOMAIN));
        }

        // rounding drift must not leave the top of the domain uncovered
        if let Some(last) = table.last_mut() {
            *last = DOMAIN;
        }
        table
    }

    // how many of the DOMAIN + 1 draw values map to id `i`
    fn width(cumulative: &[u64], i: usize) -> u64 {
        match i {
            0 => cumulative[0] + 1,
            _ => cumulative[i] - cumulative[i - 1],
        }
    }

    pub fn cumulative(&self) -> &[u64] {
        &self.cumulative
    }

    // smallest id whose cumulative value reaches `r`
    fn locate(&self, r: u64) -> usize {
        self.cumulative.partition_point(|c| *c < r)
    }

    /// One weighted draw that never returns `exclude`.
    ///
    /// The draw values owned by `exclude` are cut out of the domain and a
    /// single uniform value is drawn from the rest, which keeps the other
    /// ids in proportion without retrying.
    pub fn sample<R: Rng>(&self, rng: &mut R, exclude: usize) -> Result<usize> {

        // ids outside the table own no draw values
        let (lo, width) = match exclude {
            i if i >= self.cumulative.len() => (0, 0),
            0 => (0, NegativeSampler::width(&self.cumulative, 0)),
            i => (self.cumulative[i - 1] + 1, NegativeSampler::width(&self.cumulative, i)),
        };
        let top = DOMAIN.checked_sub(width).ok_or_else(|| {
            PipelineError::Sampling(format!("id {} covers the whole distribution", exclude))
        })?;

        let mut r = rng.gen_range(0..=top);
        if r >= lo {
            r += width;
        }
        Ok(self.locate(r))
    }
}
