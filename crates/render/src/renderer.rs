use std::fmt::Write as _;

use crate::{FramePlan, ShadingMode};

/// Backend-agnostic consumer of frame plans.
///
/// A renderer only reads the plan; scene state and the batch buffers stay
/// with the orchestrator.
pub trait Renderer {
    type Output;

    fn render(&mut self, plan: &FramePlan) -> Self::Output;
}

/// Renders a frame plan as text. Used by the CLI and in tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Also list every instance draw.
    pub verbose: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, plan: &FramePlan) -> String {
        let mut out = String::new();
        let shading = match plan.shading {
            ShadingMode::Smooth => "smooth",
            ShadingMode::Flat => "flat",
        };
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{}) ===",
            plan.frame, plan.viewport.width, plan.viewport.height
        );
        let p = plan.camera_position;
        let _ = writeln!(out, "Camera: pos=({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
        let s = plan.sky_colour;
        let _ = writeln!(
            out,
            "Shading: {shading} wireframe={} culling={} pick={}",
            plan.wireframe, plan.culling, plan.pick_enabled
        );
        let _ = writeln!(out, "Sky: ({:.2}, {:.2}, {:.2})", s.x, s.y, s.z);
        let _ = writeln!(out, "Lights: {}", plan.lights.used);
        for slot in 0..plan.lights.used {
            let c = plan.lights.colours[slot];
            let _ = writeln!(
                out,
                "  [{slot}] colour=({:.2}, {:.2}, {:.2})",
                c.x, c.y, c.z
            );
        }
        let _ = writeln!(
            out,
            "Groups: {} Instances: {} Terrains: {}",
            plan.groups.len(),
            plan.instances.len(),
            plan.terrains.len()
        );
        for group in &plan.groups {
            let _ = writeln!(
                out,
                "  group model={} texture={} indices={} cull={} objects={}..{}",
                group.key.model.0,
                group.key.texture.0,
                group.mesh.index_count,
                group.cull_back_faces,
                group.instances.start + 1,
                group.instances.end
            );
            if self.verbose {
                for draw in plan.group_instances(group) {
                    let t = draw.model_matrix.w_axis;
                    let _ = writeln!(
                        out,
                        "    #{} [{}] pos=({:.2}, {:.2}, {:.2}) tex=({:.2}, {:.2})",
                        draw.object_index,
                        draw.entity.short(),
                        t.x,
                        t.y,
                        t.z,
                        draw.tex_offset.x,
                        draw.tex_offset.y
                    );
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RenderOrchestrator, config::RenderConfig};
    use glam::Vec3;
    use pickview_assets::HeadlessLoader;
    use pickview_common::Viewport;
    use pickview_scene::{Camera, Scene, demo::build_demo_scene};

    #[test]
    fn empty_frame() {
        let scene = Scene::new(Camera::new(Vec3::new(0.0, 5.0, 5.0), 0.0, 0.0, 0.0));
        let orch = RenderOrchestrator::new(&RenderConfig::default(), Viewport::new(700, 700));
        let out = DebugTextRenderer::new().render(&orch.plan_frame(&scene));
        assert!(out.contains("=== Frame 0 (700x700) ==="));
        assert!(out.contains("Groups: 0 Instances: 0 Terrains: 0"));
        assert!(out.contains("Shading: smooth wireframe=false culling=true pick=true"));
    }

    #[test]
    fn demo_frame_lists_groups_and_instances() {
        let mut loader = HeadlessLoader::new();
        let scene = build_demo_scene(&mut loader).unwrap();
        let mut orch = RenderOrchestrator::new(&RenderConfig::default(), Viewport::new(700, 700));
        orch.submit_scene(&scene);
        let out = DebugTextRenderer::verbose().render(&orch.plan_frame(&scene));
        assert!(out.contains("Groups: 3 Instances: 7 Terrains: 4"));
        assert!(out.contains("#7 ["));
        assert!(out.contains("Lights: 2"));
    }
}
