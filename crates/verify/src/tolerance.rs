//! Tolerance model for kernel verification.

use vecbench_kernels::element::Element;
use vecbench_kernels::wide::Extended;

/// A sample passes when `|test - ref| <= atol + rtol * max(|test|, |ref|)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Tolerance {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol }
    }

    /// Fixed per-dtype pair for independent per-element results.
    pub fn elementwise<T: Element>() -> Self {
        let constants = T::ELEMENTWISE_TOLERANCE;
        Self::new(constants.rtol, constants.atol)
    }

    /// Magnitude-adaptive pair for a reduction over `visited` products.
    ///
    /// The absolute term is the larger of an epsilon-scaled multiple of the
    /// accumulated `sum(|x*y|)` and a random-walk floor growing with
    /// `sqrt(visited)`.
    pub fn reduction<T: Element>(abs_sum: f64, visited: usize) -> Self {
        let constants = T::REDUCTION_TOLERANCE;
        let scaled = constants.eps_scale * T::EPSILON * abs_sum + constants.bias;
        let floor = constants.sqrt_scale * (visited as f64).sqrt();
        Self::new(constants.rtol, scaled.max(floor))
    }

    /// Denominator of the error ratio.
    pub fn bound(&self, test: f64, reference: f64) -> f64 {
        self.atol + self.rtol * test.abs().max(reference.abs())
    }

    /// NaN on either side never passes.
    pub fn admits(&self, test: f64, reference: f64) -> bool {
        (test - reference).abs() <= self.bound(test, reference)
    }

    /// `|test - ref| / bound`; values above 1 fail.
    pub fn error_ratio(&self, test: f64, reference: f64) -> f64 {
        (test - reference).abs() / self.bound(test, reference)
    }

    /// Comparison carried out in extended precision, for scalar reductions.
    pub fn compare_extended(&self, test: Extended, reference: Extended) -> (bool, f64) {
        let difference = (test - reference).abs().to_f64();
        let bound = self.atol + self.rtol * test.abs().max(reference.abs()).to_f64();
        (difference <= bound, difference / bound)
    }
}
