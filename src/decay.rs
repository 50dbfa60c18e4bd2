/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f32) -> f32;
}

fn validate(rate: f32, vi: f32, vf: f32) -> Result<(), String> {
    ((rate >= 0.0 && vi >= vf) || (rate < 0.0 && vi <= vf))
        .then_some(())
        .ok_or_else(|| String::from("`vi - vf` must have same sign as `rate`"))
}

/// A constant value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constant {
    value: f32,
}

impl Constant {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl Decay for Constant {
    fn evaluate(&self, _t: f32) -> f32 {
        self.value
    }
}

/// v(t) = v<sub>f</sub> + (v<sub>i</sub> - v<sub>f</sub>) * e<sup>-rt</sup>
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exponential {
    rate: f32,
    vi: f32,
    vf: f32,
}

impl Exponential {
    pub fn new(rate: f32, vi: f32, vf: f32) -> Result<Self, String> {
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }
}

impl Decay for Exponential {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { rate, vi, vf } = self;
        vf + (vi - vf) * (-rate * t).exp()
    }
}

/// v(t) = v<sub>i</sub> - rt, clamped at v<sub>f</sub>
///
/// Works in both directions: a negative rate grows from `vi` up to `vf`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linear {
    rate: f32,
    vi: f32,
    vf: f32,
}

impl Linear {
    pub fn new(rate: f32, vi: f32, vf: f32) -> Result<Self, String> {
        validate(rate, vi, vf)?;
        Ok(Self { rate, vi, vf })
    }

    /// Interpolate from `vi` to `vf` over `steps` evenly spaced points
    ///
    /// Evaluating at step `t` gives the same value as indexing
    /// `linspace(vi, vf, steps)` at `min(t, steps - 1)`.
    pub fn from_steps(vi: f32, vf: f32, steps: usize) -> Result<Self, String> {
        if steps == 0 {
            return Err(String::from("`steps` must be at least 1"));
        }
        if steps == 1 {
            // linspace with a single point holds the start value
            return Ok(Self { rate: 0.0, vi, vf: vi });
        }
        let rate = (vi - vf) / (steps - 1) as f32;
        Self::new(rate, vi, vf)
    }
}

impl Decay for Linear {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { rate, vi, vf } = self;
        let v = vi - rate * t;
        if rate >= 0.0 {
            v.max(vf)
        } else {
            v.min(vf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_functional() {
        assert!(validate(1.0, 1.0, 0.0).is_ok());
        assert!(validate(1.0, -1.0, 0.0).is_err());
        assert!(validate(-1.0, 1.0, 0.0).is_err());
        assert!(validate(-1.0, -1.0, 0.0).is_ok());
        assert!(validate(0.0, 0.5, 0.5).is_ok());
    }

    #[test]
    fn constant_decay() {
        let x = Constant::new(1.0);
        assert_eq!(x.evaluate(0.0), 1.0);
        assert_eq!(x.evaluate(1.0), 1.0);
    }

    #[test]
    fn exponential_decay() {
        let x = Exponential::new(2.0, 2.0, 0.5).unwrap();
        assert_eq!(x.evaluate(0.0), 2.0);
        assert_eq!(x.evaluate(1.0), 0.5 + 1.5 * f32::exp(-2.0));
    }

    #[test]
    fn linear_decay() {
        let x = Linear::new(0.5, 2.0, 0.5).unwrap();
        assert_eq!(x.evaluate(0.0), 2.0);
        assert_eq!(x.evaluate(1.0), 1.5);
        assert_eq!(x.evaluate(10.0), 0.5);
    }

    #[test]
    fn linear_growth() {
        let x = Linear::new(-0.25, 0.0, 1.0).unwrap();
        assert_eq!(x.evaluate(2.0), 0.5);
        assert_eq!(x.evaluate(100.0), 1.0);
    }

    #[test]
    fn linear_from_steps_matches_linspace() {
        let x = Linear::from_steps(1.0, 0.0, 5).unwrap();
        let expected = [1.0, 0.75, 0.5, 0.25, 0.0];
        for (t, v) in expected.iter().enumerate() {
            assert!((x.evaluate(t as f32) - v).abs() < 1e-6, "value at step {t}");
        }
        assert_eq!(x.evaluate(5.0), 0.0, "clamped after the last step");
        assert_eq!(x.evaluate(1e6), 0.0, "clamped after the last step");
    }

    #[test]
    fn linear_from_steps_edge_cases() {
        assert!(Linear::from_steps(1.0, 0.1, 0).is_err());
        let single = Linear::from_steps(1.0, 0.1, 1).unwrap();
        assert_eq!(single.evaluate(0.0), 1.0);
        assert_eq!(single.evaluate(50.0), 1.0);
    }
}
