//! Point-mass body shared by the host and accelerator backends

use bytemuck::{Pod, Zeroable};
use glam::DVec2;

use crate::error::{PhysicsError, Result};

/// GPU-compatible body structure
///
/// Layout matches the WGSL `Body` struct: `vec2<f64>` members are 16-byte
/// aligned, so the struct is padded to 48 bytes. The host backend works on the
/// same slice that is uploaded to the device, without conversion.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Body {
    position: [f64; 2],
    velocity: [f64; 2],
    mass: f64,
    _padding: f64,
}

impl Body {
    /// Create a body, rejecting non-positive or non-finite mass
    pub fn new(position: DVec2, velocity: DVec2, mass: f64) -> Result<Self> {
        check_mass(0, mass)?;
        Ok(Self {
            position: position.to_array(),
            velocity: velocity.to_array(),
            mass,
            _padding: 0.0,
        })
    }

    /// Create a body with zero velocity
    pub fn at_rest(position: DVec2, mass: f64) -> Result<Self> {
        Self::new(position, DVec2::ZERO, mass)
    }

    pub fn position(&self) -> DVec2 {
        DVec2::from_array(self.position)
    }

    pub fn velocity(&self) -> DVec2 {
        DVec2::from_array(self.velocity)
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn set_position(&mut self, position: DVec2) {
        self.position = position.to_array();
    }

    pub fn set_velocity(&mut self, velocity: DVec2) {
        self.velocity = velocity.to_array();
    }
}

fn check_mass(index: usize, mass: f64) -> Result<()> {
    if mass.is_finite() && mass > 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidMass { index, mass })
    }
}

/// Check the mass invariant over a whole sequence.
///
/// `Body` is `Zeroable` and may arrive from raw buffers, so backends call this
/// on entry instead of trusting construction alone. Reports the first
/// offending index.
pub fn validate_bodies(bodies: &[Body]) -> Result<()> {
    bodies
        .iter()
        .enumerate()
        .try_for_each(|(index, body)| check_mass(index, body.mass))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_layout_matches_wgsl() {
        assert_eq!(std::mem::size_of::<Body>(), 48);
        assert_eq!(std::mem::align_of::<Body>(), 8);
    }

    #[test]
    fn test_new_rejects_invalid_mass() {
        for mass in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = Body::at_rest(DVec2::ZERO, mass);
            assert!(
                matches!(result, Err(PhysicsError::InvalidMass { index: 0, .. })),
                "mass {mass} should be rejected"
            );
        }
    }

    #[test]
    fn test_accessors_round_trip() {
        let mut body = Body::new(DVec2::new(1.0, 2.0), DVec2::new(-3.0, 4.0), 5.0).unwrap();
        assert_eq!(body.position(), DVec2::new(1.0, 2.0));
        assert_eq!(body.velocity(), DVec2::new(-3.0, 4.0));
        assert_eq!(body.mass(), 5.0);

        body.set_velocity(DVec2::new(0.5, 0.5));
        body.set_position(DVec2::new(7.0, 8.0));
        assert_eq!(body.velocity(), DVec2::new(0.5, 0.5));
        assert_eq!(body.position(), DVec2::new(7.0, 8.0));
    }

    #[test]
    fn test_validate_reports_first_bad_index() {
        let good = Body::at_rest(DVec2::ZERO, 1.0).unwrap();
        let bodies = [good, good, Body::zeroed(), Body::zeroed()];

        assert_eq!(
            validate_bodies(&bodies),
            Err(PhysicsError::InvalidMass {
                index: 2,
                mass: 0.0
            })
        );
        assert_eq!(validate_bodies(&bodies[..2]), Ok(()));
        assert_eq!(validate_bodies(&[]), Ok(()));
    }
}
