//! Scalar response curves used for height shaping and border blending.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single key of a piecewise-linear curve.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

impl CurveKey {
    pub fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Maps an input in `[0, 1]` to an output value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Curve {
    /// Identity on `[0, 1]`.
    #[default]
    Linear,
    /// Smoothstep from 0 to 1 with flat tangents at both ends.
    EaseInOut,
    /// Piecewise-linear through the given keys, held constant outside them.
    /// Keys must be sorted by time.
    Keys(Vec<CurveKey>),
}

impl Curve {
    /// Construct a keyed curve, sorting keys by time.
    pub fn from_keys(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Curve::Keys(keys)
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        match self {
            Curve::Linear => t.clamp(0.0, 1.0),
            Curve::EaseInOut => {
                let t = t.clamp(0.0, 1.0);
                t * t * (3.0 - 2.0 * t)
            }
            Curve::Keys(keys) => evaluate_keys(keys, t),
        }
    }

    /// Largest key value, floored at zero. Used to bound the world height range.
    pub fn max_value(&self) -> f32 {
        match self {
            Curve::Linear | Curve::EaseInOut => 1.0,
            Curve::Keys(keys) => keys
                .iter()
                .map(|k| k.value)
                .fold(f32::MIN, f32::max)
                .max(0.0),
        }
    }
}

fn evaluate_keys(keys: &[CurveKey], t: f32) -> f32 {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return 0.0;
    };
    if t <= first.time {
        return first.value;
    }
    if t >= last.time {
        return last.value;
    }
    for pair in keys.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.time {
            let span = b.time - a.time;
            if span <= f32::EPSILON {
                return b.value;
            }
            let f = (t - a.time) / span;
            return a.value + (b.value - a.value) * f;
        }
    }
    last.value
}
