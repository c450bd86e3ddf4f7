use glam::Vec3;
use pickview_scene::Light;

/// Light slots every shading program declares.
pub const MAX_LIGHTS: usize = 4;

/// Neutral attenuation for unused slots: no falloff, no division by zero.
pub const NEUTRAL_ATTENUATION: Vec3 = Vec3::new(1.0, 0.0, 0.0);

/// Fully populated light arrays as uploaded to the shaders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightBlock {
    pub positions: [Vec3; MAX_LIGHTS],
    pub colours: [Vec3; MAX_LIGHTS],
    pub attenuations: [Vec3; MAX_LIGHTS],
    /// Scene lights that made it into a slot.
    pub used: usize,
}

impl Default for LightBlock {
    fn default() -> Self {
        Self {
            positions: [Vec3::ZERO; MAX_LIGHTS],
            colours: [Vec3::ZERO; MAX_LIGHTS],
            attenuations: [NEUTRAL_ATTENUATION; MAX_LIGHTS],
            used: 0,
        }
    }
}

impl LightBlock {
    /// Fill slots from the first [`MAX_LIGHTS`] lights. Disabled lights
    /// keep their slot with a zero colour.
    pub fn from_lights(lights: &[Light]) -> Self {
        if lights.len() > MAX_LIGHTS {
            tracing::debug!(
                lights = lights.len(),
                max = MAX_LIGHTS,
                "extra lights ignored"
            );
        }
        let mut block = Self::default();
        for (slot, light) in lights.iter().take(MAX_LIGHTS).enumerate() {
            block.positions[slot] = light.position;
            block.colours[slot] = light.effective_color();
            block.attenuations[slot] = light.attenuation;
            block.used = slot + 1;
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_slots_are_neutral() {
        let lights = [Light::new(Vec3::ONE, Vec3::new(0.5, 0.5, 0.5))
            .with_attenuation(Vec3::new(1.0, 0.1, 0.01))];
        let block = LightBlock::from_lights(&lights);
        assert_eq!(block.used, 1);
        assert_eq!(block.colours[0], Vec3::splat(0.5));
        assert_eq!(block.attenuations[0], Vec3::new(1.0, 0.1, 0.01));
        for slot in 1..MAX_LIGHTS {
            assert_eq!(block.positions[slot], Vec3::ZERO);
            assert_eq!(block.colours[slot], Vec3::ZERO);
            assert_eq!(block.attenuations[slot], NEUTRAL_ATTENUATION);
        }
    }

    #[test]
    fn disabled_light_uploads_zero_colour() {
        let mut light = Light::new(Vec3::ONE, Vec3::ONE);
        light.set_enabled(false);
        let block = LightBlock::from_lights(&[light]);
        assert_eq!(block.colours[0], Vec3::ZERO);
        assert_eq!(block.positions[0], Vec3::ONE);
    }

    #[test]
    fn extra_lights_are_truncated() {
        let lights: Vec<_> = (0..6)
            .map(|i| Light::new(Vec3::splat(i as f32), Vec3::ONE))
            .collect();
        let block = LightBlock::from_lights(&lights);
        assert_eq!(block.used, MAX_LIGHTS);
        assert_eq!(block.positions[3], Vec3::splat(3.0));
    }
}
