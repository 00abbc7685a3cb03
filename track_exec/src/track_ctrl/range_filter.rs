//! # Range filter
//!
//! A scalar Kalman filter which smooths the triangulated range to the target.
//!
//! The range is modelled as constant between cycles (a random walk), which
//! holds well since the range changes slowly compared to the cycle rate. The
//! only uncertainty added in the prediction step is therefore the process
//! noise, and the measurement is the range itself.
//!
//! Because the process noise is added back every cycle the error covariance
//! never reaches zero. Under repeated measurements it settles at
//!
//! ```text
//! P = (-q + sqrt(q^2 + 4 q r)) / 2
//! ```
//!
//! where `q` is the process noise and `r` the measurement noise.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default process noise variance.
///
/// Units: meters^2
pub const DEFAULT_PROCESS_NOISE: f64 = 1e-4;

/// Default measurement noise variance.
///
/// Units: meters^2
pub const DEFAULT_MEASUREMENT_NOISE: f64 = 1.0;

/// Range estimate the filter starts from.
///
/// Units: meters
pub const INITIAL_ESTIMATE_M: f64 = 0.0;

/// Error covariance the filter starts from.
///
/// Units: meters^2
pub const INITIAL_ERROR_COVARIANCE: f64 = 1.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Scalar Kalman filter on the range to the target.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RangeFilter {
    /// Current range estimate
    estimate_m: f64,

    /// Variance of the range estimate
    error_cov: f64,

    /// Variance added to the estimate every cycle
    process_noise: f64,

    /// Variance of a single measurement
    measurement_noise: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RangeFilterError {
    #[error("Process noise must be finite and positive, got {0}")]
    InvalidProcessNoise(f64),

    #[error("Measurement noise must be finite and positive, got {0}")]
    InvalidMeasurementNoise(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RangeFilter {
    /// Create a new filter with the given noise variances.
    pub fn new(process_noise: f64, measurement_noise: f64) -> Result<Self, RangeFilterError> {
        if !(process_noise.is_finite() && process_noise > 0.0) {
            return Err(RangeFilterError::InvalidProcessNoise(process_noise));
        }
        if !(measurement_noise.is_finite() && measurement_noise > 0.0) {
            return Err(RangeFilterError::InvalidMeasurementNoise(measurement_noise));
        }

        Ok(Self {
            estimate_m: INITIAL_ESTIMATE_M,
            error_cov: INITIAL_ERROR_COVARIANCE,
            process_noise,
            measurement_noise,
        })
    }

    /// Fuse a new raw range measurement into the estimate, returning the
    /// smoothed range.
    pub fn update(&mut self, raw_range_m: f64) -> f64 {
        // Predict, the range is carried forward unchanged
        let pred_cov = self.error_cov + self.process_noise;

        // Update
        let gain = pred_cov / (pred_cov + self.measurement_noise);
        let smoothed_m = self.estimate_m + gain * (raw_range_m - self.estimate_m);

        self.estimate_m = smoothed_m;
        self.error_cov = (1.0 - gain) * pred_cov;

        smoothed_m
    }

    /// The current range estimate.
    ///
    /// Units: meters
    pub fn estimate_m(&self) -> f64 {
        self.estimate_m
    }

    /// The current error covariance of the estimate.
    ///
    /// Units: meters^2
    pub fn error_covariance(&self) -> f64 {
        self.error_cov
    }

    /// The covariance the filter settles at under continuous measurement.
    pub fn steady_state_covariance(&self) -> f64 {
        let q = self.process_noise;
        let r = self.measurement_noise;

        (-q + (q * q + 4.0 * q * r).sqrt()) / 2.0
    }
}

impl Default for RangeFilter {
    fn default() -> Self {
        Self {
            estimate_m: INITIAL_ESTIMATE_M,
            error_cov: INITIAL_ERROR_COVARIANCE,
            process_noise: DEFAULT_PROCESS_NOISE,
            measurement_noise: DEFAULT_MEASUREMENT_NOISE,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_first_update() {
        let mut filter = RangeFilter::default();

        // From an estimate of 0 with unit covariance the gain is just over a
        // half
        let pred_cov = 1.0 + DEFAULT_PROCESS_NOISE;
        let gain = pred_cov / (pred_cov + 1.0);

        let smoothed = filter.update(4.0);

        assert!((smoothed - 4.0 * gain).abs() < 1e-12);
        assert_eq!(filter.estimate_m(), smoothed);
        assert!((filter.error_covariance() - (1.0 - gain) * pred_cov).abs() < 1e-12);
    }

    #[test]
    fn test_deterministic() {
        let measurements = [2.31, 2.45, 2.12, 2.60, 2.38, 2.29, 2.51];

        let mut a = RangeFilter::new(2e-4, 0.5).unwrap();
        let mut b = RangeFilter::new(2e-4, 0.5).unwrap();

        for m in measurements.iter() {
            assert_eq!(a.update(*m).to_bits(), b.update(*m).to_bits());
        }
        assert_eq!(a.error_covariance().to_bits(), b.error_covariance().to_bits());
    }

    #[test]
    fn test_convergence() {
        const RANGE_M: f64 = 3.0;

        let mut filter = RangeFilter::default();
        let steady_cov = filter.steady_state_covariance();

        let mut prev_est = filter.estimate_m();
        let mut prev_cov = filter.error_covariance();

        // While far from steady state the estimate approaches the measurement
        // and the covariance falls every cycle
        for _ in 0..200 {
            let est = filter.update(RANGE_M);
            let cov = filter.error_covariance();

            assert!(est > prev_est && est < RANGE_M);
            assert!(cov < prev_cov);
            assert!(cov > steady_cov);

            prev_est = est;
            prev_cov = cov;
        }

        for _ in 0..2000 {
            filter.update(RANGE_M);
        }

        assert!((filter.estimate_m() - RANGE_M).abs() < 1e-3);
        assert!((filter.error_covariance() - steady_cov).abs() < 1e-6);
        assert!(filter.error_covariance() > 0.0);
    }

    #[test]
    fn test_steady_state_value() {
        let filter = RangeFilter::new(1e-4, 1.0).unwrap();

        // P = P' r / (P' + r) with P' = P + q
        let p = filter.steady_state_covariance();
        let pred = p + 1e-4;
        assert!((p - pred / (pred + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_noise() {
        assert!(matches!(
            RangeFilter::new(0.0, 1.0),
            Err(RangeFilterError::InvalidProcessNoise(_))
        ));
        assert!(matches!(
            RangeFilter::new(1e-4, f64::NAN),
            Err(RangeFilterError::InvalidMeasurementNoise(_))
        ));
        assert!(matches!(
            RangeFilter::new(1e-4, -1.0),
            Err(RangeFilterError::InvalidMeasurementNoise(_))
        ));
    }
}
