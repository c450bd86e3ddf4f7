/// Shading programs for the visible pass. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingMode {
    #[default]
    Smooth,
    Flat,
}

/// Frame-wide render state owned by the orchestrator and read by every
/// draw of a frame. Wireframe is independent of the shading mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderToggles {
    shading: ShadingMode,
    wireframe: bool,
    culling: bool,
}

impl Default for RenderToggles {
    fn default() -> Self {
        Self {
            shading: ShadingMode::Smooth,
            wireframe: false,
            culling: true,
        }
    }
}

impl RenderToggles {
    pub fn shading(&self) -> ShadingMode {
        self.shading
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn culling(&self) -> bool {
        self.culling
    }

    pub fn enable_smooth_shading(&mut self) {
        self.shading = ShadingMode::Smooth;
    }

    pub fn enable_flat_shading(&mut self) {
        self.shading = ShadingMode::Flat;
    }

    pub fn toggle_shading(&mut self) -> ShadingMode {
        match self.shading {
            ShadingMode::Smooth => self.enable_flat_shading(),
            ShadingMode::Flat => self.enable_smooth_shading(),
        }
        self.shading
    }

    pub fn set_wireframe(&mut self, on: bool) {
        self.wireframe = on;
    }

    pub fn toggle_wireframe(&mut self) -> bool {
        self.wireframe = !self.wireframe;
        self.wireframe
    }

    pub fn set_culling(&mut self, on: bool) {
        self.culling = on;
    }

    pub fn toggle_culling(&mut self) -> bool {
        self.culling = !self.culling;
        self.culling
    }
}
