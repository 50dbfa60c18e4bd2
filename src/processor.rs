/// Turns a raw observation into the normalized, fixed-shape state consumed by an estimator
///
/// ### Generics
/// - `O`: The raw observation produced by an [`Environment`](crate::env::Environment)
pub trait StateProcessor<O> {
    /// The processed state
    type State: Clone;

    fn process(&self, observation: &O) -> Self::State;
}

/// Normalizes observations by dividing every element by a fixed scale
///
/// ```
/// use deepq::processor::{Rescale, StateProcessor};
///
/// let pixels = [[[0u8, 255], [51, 102]]; 1];
/// let state = Rescale::new(255.0).process(&pixels);
/// assert_eq!(state, [[[0.0, 1.0], [0.2, 0.4]]; 1]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rescale {
    scale: f32,
}

impl Rescale {
    /// **Panics** if `scale` is not a positive, finite number
    pub fn new(scale: f32) -> Self {
        assert!(
            scale.is_finite() && scale > 0.0,
            "Rescale factor must be positive and finite, got {scale}"
        );
        Self { scale }
    }

    /// Scale 8-bit pixel intensities into `[0, 1]`
    pub fn pixels() -> Self {
        Self::new(u8::MAX as f32)
    }
}

impl<const C: usize, const H: usize, const W: usize> StateProcessor<[[[u8; W]; H]; C]> for Rescale {
    type State = [[[f32; W]; H]; C];

    fn process(&self, observation: &[[[u8; W]; H]; C]) -> Self::State {
        observation.map(|plane| plane.map(|row| row.map(|x| x as f32 / self.scale)))
    }
}

impl<const N: usize> StateProcessor<[f32; N]> for Rescale {
    type State = [f32; N];

    fn process(&self, observation: &[f32; N]) -> Self::State {
        observation.map(|x| x / self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_grid() {
        let observation = [[[0u8, 1, 2], [2, 1, 0], [0, 0, 2]]; 1];
        let state = Rescale::new(2.0).process(&observation);
        assert_eq!(state[0][0], [0.0, 0.5, 1.0]);
        assert_eq!(state[0][2], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn rescale_vector() {
        let state = Rescale::new(4.0).process(&[2.0, -8.0]);
        assert_eq!(state, [0.5, -2.0]);
    }

    #[test]
    fn rescale_pixels() {
        let state = Rescale::pixels().process(&[[[255u8]]]);
        assert_eq!(state, [[[1.0]]]);
    }

    #[test]
    #[should_panic(expected = "positive and finite")]
    fn rescale_rejects_zero() {
        Rescale::new(0.0);
    }
}
