use glam::Vec3;

/// Point light with distance attenuation.
///
/// Disabling a light never touches `color`; shaders read
/// [`Light::effective_color`] instead, so re-enabling restores the exact
/// original value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    color: Vec3,
    /// Constant, linear and quadratic falloff coefficients.
    pub attenuation: Vec3,
    enabled: bool,
    can_toggle: bool,
}

impl Light {
    /// Unattenuated, enabled, toggleable light.
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self {
            position,
            color,
            attenuation: Vec3::new(1.0, 0.0, 0.0),
            enabled: true,
            can_toggle: true,
        }
    }

    pub fn with_attenuation(mut self, attenuation: Vec3) -> Self {
        self.attenuation = attenuation;
        self
    }

    /// Lock the light in its current state; toggles are ignored.
    pub fn locked(mut self) -> Self {
        self.can_toggle = false;
        self
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
    }

    /// Colour presented to shaders: zero while disabled.
    pub fn effective_color(&self) -> Vec3 {
        if self.enabled { self.color } else { Vec3::ZERO }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn can_toggle(&self) -> bool {
        self.can_toggle
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Flip on/off unless locked. Returns whether the state changed.
    pub fn toggle(&mut self) -> bool {
        if !self.can_toggle {
            return false;
        }
        self.enabled = !self.enabled;
        true
    }
}
