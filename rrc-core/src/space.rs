//! Action and observation spaces.
//!
//! Spaces describe the valid value ranges of actions and observations. They
//! are used to check actions returned by a policy and to sample random
//! observations for smoke-testing a policy.
use crate::error::RrcError;
use ndarray::{concatenate, Array1, ArrayView1, Axis};
use rand::Rng;
use std::collections::BTreeMap;

/// Action of an environment.
pub type Action = Array1<f32>;

/// A continuous box with one `[low, high]` interval per dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxSpace {
    low: Array1<f32>,
    high: Array1<f32>,
}

impl BoxSpace {
    /// Constructs a box from its lower and upper bounds.
    ///
    /// Fails if the bounds have different lengths or `low[i] > high[i]` for some `i`.
    pub fn new(low: Array1<f32>, high: Array1<f32>) -> Result<Self, RrcError> {
        if low.len() != high.len() {
            return Err(RrcError::SpaceError(format!(
                "low has {} dimensions but high has {}",
                low.len(),
                high.len()
            )));
        }
        if let Some(i) = (0..low.len()).find(|&i| !(low[i] <= high[i])) {
            return Err(RrcError::SpaceError(format!(
                "low[{}] = {} is not <= high[{}] = {}",
                i, low[i], i, high[i]
            )));
        }
        Ok(Self { low, high })
    }

    /// Constructs a box with the same bounds in every dimension.
    pub fn uniform(dim: usize, low: f32, high: f32) -> Result<Self, RrcError> {
        Self::new(Array1::from_elem(dim, low), Array1::from_elem(dim, high))
    }

    /// Number of dimensions.
    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Lower bounds.
    pub fn low(&self) -> &Array1<f32> {
        &self.low
    }

    /// Upper bounds.
    pub fn high(&self) -> &Array1<f32> {
        &self.high
    }

    /// Returns `true` if `x` has the dimension of the space and every element
    /// lies in `[low, high]`. NaN is never contained.
    pub fn contains(&self, x: &Array1<f32>) -> bool {
        self.contains_view(x.view())
    }

    fn contains_view(&self, x: ArrayView1<f32>) -> bool {
        x.len() == self.dim()
            && x
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(v, (lo, hi))| *lo <= *v && *v <= *hi)
    }

    /// Indices of elements lying outside of the space.
    ///
    /// Returns `None` if the dimension does not match.
    pub fn violations(&self, x: &Array1<f32>) -> Option<Vec<usize>> {
        if x.len() != self.dim() {
            return None;
        }
        Some(
            (0..x.len())
                .filter(|&i| !(self.low[i] <= x[i] && x[i] <= self.high[i]))
                .collect(),
        )
    }

    /// Samples a point from the box.
    ///
    /// Bounded dimensions are sampled uniformly. A dimension unbounded on one
    /// side is sampled from an exponential distribution shifted to the finite
    /// bound, a dimension unbounded on both sides from the standard normal.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f32> {
        self.low
            .iter()
            .zip(self.high.iter())
            .map(|(lo, hi)| sample_interval(*lo, *hi, rng))
            .collect()
    }

    /// Clips `x` into the box.
    pub fn clip(&self, x: &Array1<f32>) -> Array1<f32> {
        x.iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .map(|(v, (lo, hi))| v.max(*lo).min(*hi))
            .collect()
    }
}

fn sample_interval<R: Rng + ?Sized>(lo: f32, hi: f32, rng: &mut R) -> f32 {
    if !(lo < hi) {
        return lo;
    }
    // f64 keeps `hi - lo` finite for any finite f32 bounds.
    let (lo_, hi_) = (lo as f64, hi as f64);
    let x = match (lo.is_finite(), hi.is_finite()) {
        (true, true) => rng.gen_range(lo_..=hi_),
        (true, false) => lo_ + sample_exponential(rng),
        (false, true) => hi_ - sample_exponential(rng),
        (false, false) => sample_standard_normal(rng),
    };
    (x as f32).max(lo).min(hi)
}

fn sample_exponential<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    -(1.0 - rng.gen::<f64>()).ln()
}

/// Box-Muller transform.
fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Observation of an environment.
#[derive(Clone, Debug, PartialEq)]
pub enum Observation {
    /// A single one-dimensional vector.
    Flat(Array1<f32>),

    /// Named fields, each a one-dimensional vector.
    Structured(BTreeMap<String, Array1<f32>>),
}

impl Observation {
    /// Concatenates the fields of a structured observation in key order.
    pub fn flatten(&self) -> Array1<f32> {
        match self {
            Self::Flat(x) => x.clone(),
            Self::Structured(fields) => concat(fields.values().map(|x| x.view())),
        }
    }

    /// Returns the field of a structured observation.
    pub fn field(&self, name: &str) -> Option<&Array1<f32>> {
        match self {
            Self::Flat(_) => None,
            Self::Structured(fields) => fields.get(name),
        }
    }
}

fn concat<'a>(views: impl Iterator<Item = ArrayView1<'a, f32>>) -> Array1<f32> {
    let views: Vec<_> = views.collect();
    if views.is_empty() {
        return Array1::zeros(0);
    }
    // Concatenation of 1-d arrays along their only axis cannot fail.
    concatenate(Axis(0), &views).unwrap_or_else(|_| Array1::zeros(0))
}

/// Space of observations, either flat or structured.
#[derive(Clone, Debug, PartialEq)]
pub enum ObservationSpace {
    /// Observations are single vectors.
    Flat(BoxSpace),

    /// Observations are named fields.
    Structured(BTreeMap<String, BoxSpace>),
}

impl ObservationSpace {
    /// Returns `true` for [`ObservationSpace::Flat`].
    pub fn is_flat(&self) -> bool {
        matches!(self, Self::Flat(_))
    }

    /// Converts the space into the space of flattened observations.
    pub fn flatten(&self) -> BoxSpace {
        match self {
            Self::Flat(space) => space.clone(),
            Self::Structured(fields) => BoxSpace {
                low: concat(fields.values().map(|s| s.low.view())),
                high: concat(fields.values().map(|s| s.high.view())),
            },
        }
    }

    /// Samples a random observation.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Observation {
        match self {
            Self::Flat(space) => Observation::Flat(space.sample(rng)),
            Self::Structured(fields) => Observation::Structured(
                fields
                    .iter()
                    .map(|(k, s)| (k.clone(), s.sample(rng)))
                    .collect(),
            ),
        }
    }

    /// Returns `true` if the observation has the layout of the space and lies in it.
    pub fn contains(&self, obs: &Observation) -> bool {
        match (self, obs) {
            (Self::Flat(space), Observation::Flat(x)) => space.contains(x),
            (Self::Structured(fields), Observation::Structured(values)) => {
                fields.len() == values.len()
                    && fields.iter().all(|(k, s)| match values.get(k) {
                        Some(x) => s.contains(x),
                        None => false,
                    })
            }
            _ => false,
        }
    }
}
