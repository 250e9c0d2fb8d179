//! Wrapping phase into its principal range and unwrapping it into a continuous curve.
use crate::dataset::{Channel, DatasetError};
use itertools::Itertools;
use std::f64::consts::{PI, TAU};

type Result<T> = std::result::Result<T, DatasetError>;

/// A jump between neighbouring samples larger than this is taken to be a 360° wrap.
/// Long paths have steep phase slopes, so this sits well below 360°.
pub const UNWRAP_THRESHOLD_DEG: f64 = 300.0;

/// Wraps one phase value into (-180°, 180°]
pub fn wrap_degree(phase_deg: f64) -> f64 {
    let r = phase_deg.rem_euclid(360.0);
    if r > 180.0 {
        r - 360.0
    } else {
        r
    }
}

/// Wraps one phase value into (-π, π]
pub fn wrap_radian(phase_rad: f64) -> f64 {
    let r = phase_rad.rem_euclid(TAU);
    if r > PI {
        r - TAU
    } else {
        r
    }
}

pub fn wrap_degrees(phases_deg: &[f64]) -> Vec<f64> {
    phases_deg.iter().map(|&p| wrap_degree(p)).collect()
}

pub fn wrap_radians(phases_rad: &[f64]) -> Vec<f64> {
    phases_rad.iter().map(|&p| wrap_radian(p)).collect()
}

/// Unwraps a phase sequence (degrees) using [`UNWRAP_THRESHOLD_DEG`].
pub fn unwrap_degrees(phases_deg: &[f64]) -> Vec<f64> {
    unwrap_degrees_with_threshold(phases_deg, UNWRAP_THRESHOLD_DEG)
}

/// Unwraps a phase sequence (degrees) sampled in ascending frequency order.
///
/// A forward jump larger than `threshold_deg` drops this and every following sample by
/// 360°, a backward jump larger than `threshold_deg` raises them by 360°. Sequences that
/// already leave [-180°, 180°] are treated as unwrapped and returned unchanged.
pub fn unwrap_degrees_with_threshold(phases_deg: &[f64], threshold_deg: f64) -> Vec<f64> {
    if !is_wrapped(phases_deg) {
        return phases_deg.to_vec();
    }
    let mut unwrapped = Vec::with_capacity(phases_deg.len());
    if let Some(&first) = phases_deg.first() {
        unwrapped.push(first);
    }
    let mut offset = 0.0;
    for (prev, cur) in phases_deg.iter().tuple_windows() {
        let jump = cur - prev;
        if jump > threshold_deg {
            offset -= 360.0;
        } else if jump < -threshold_deg {
            offset += 360.0;
        }
        unwrapped.push(cur + offset);
    }
    unwrapped
}

fn is_wrapped(phases_deg: &[f64]) -> bool {
    phases_deg.iter().all(|p| (-180.0..=180.0).contains(p))
}

/// Returns a copy of `channel` with its phase wrapped into (-180°, 180°].
///
/// # Errors
/// Will return `Err` if the channel carries no phase.
pub fn wrap_phase(channel: &Channel) -> Result<Channel> {
    let wrapped = wrap_degrees(channel.phase_deg()?);
    channel.clone().with_phase_deg(wrapped)
}

/// Returns a copy of `channel` with its phase unwrapped into a continuous curve.
///
/// # Errors
/// Will return `Err` if the channel carries no phase.
pub fn unwrap_phase(channel: &Channel) -> Result<Channel> {
    unwrap_phase_with_threshold(channel, UNWRAP_THRESHOLD_DEG)
}

pub fn unwrap_phase_with_threshold(channel: &Channel, threshold_deg: f64) -> Result<Channel> {
    let unwrapped = unwrap_degrees_with_threshold(channel.phase_deg()?, threshold_deg);
    channel.clone().with_phase_deg(unwrapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn wrap_range_and_idempotence() {
        let phases: Vec<f64> = (-20..20).map(|i| i as f64 * 97.3 + 0.25).collect();
        let once = wrap_degrees(&phases);
        let twice = wrap_degrees(&once);
        for (a, b) in once.iter().zip(twice.iter()) {
            assert!(*a > -180.0 && *a <= 180.0, "{a} out of range");
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
        assert_eq!(wrap_degree(-180.0), 180.0);
        assert_eq!(wrap_degree(540.0), 180.0);
    }

    #[test]
    fn wrap_radian_range() {
        for i in -50..50 {
            let w = wrap_radian(i as f64 * 0.77);
            assert!(w > -PI && w <= PI);
            assert_abs_diff_eq!(wrap_radian(w), w, epsilon = 1e-12);
        }
    }

    #[test]
    fn unwrap_recovers_ramp() {
        // 7 degrees per step, wrapped many times over
        let k = 7.0;
        let wrapped: Vec<f64> = (0..300).map(|i| wrap_degree(k * i as f64)).collect();
        let unwrapped = unwrap_degrees(&wrapped);
        for (a, b) in unwrapped.iter().tuple_windows() {
            assert_abs_diff_eq!(b - a, k, epsilon = 1e-9);
        }
    }

    #[test]
    fn unwrap_recovers_falling_ramp() {
        let wrapped: Vec<f64> = (0..200).map(|i| wrap_degree(-11.5 * i as f64 + 30.0)).collect();
        let unwrapped = unwrap_degrees(&wrapped);
        for (i, p) in unwrapped.iter().enumerate() {
            assert_abs_diff_eq!(*p, -11.5 * i as f64 + 30.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn unwrap_leaves_continuous_data_alone() {
        let continuous: Vec<f64> = (0..50).map(|i| -400.0 + i as f64 * 3.0).collect();
        assert_eq!(unwrap_degrees(&continuous), continuous);
        let twice = unwrap_degrees(&unwrap_degrees(&[170.0, -170.0, -150.0]));
        assert_eq!(twice, vec![170.0, 190.0, 210.0]);
    }

    #[test]
    fn channel_without_phase_fails() {
        let c = Channel::new(vec![1, 2]).unwrap();
        assert!(matches!(
            unwrap_phase(&c),
            Err(DatasetError::InvalidChannelShape(_))
        ));
        assert!(wrap_phase(&c).is_err());
    }

    #[test]
    fn unwrap_phase_keeps_other_columns() {
        let c = Channel::new(vec![1, 2, 3])
            .unwrap()
            .with_magnitude_db(vec![-1.0, -2.0, -3.0])
            .unwrap()
            .with_phase_deg(vec![175.0, -178.0, -171.0])
            .unwrap();
        let u = unwrap_phase(&c).unwrap();
        assert_eq!(u.magnitude_db().unwrap(), c.magnitude_db().unwrap());
        assert_eq!(u.phase_deg().unwrap(), &[175.0, 182.0, 189.0]);
    }
}
