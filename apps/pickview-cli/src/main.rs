use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use glam::{Vec2, Vec3};
use pickview_assets::HeadlessLoader;
use pickview_common::Viewport;
use pickview_input::Action;
use pickview_render::{DebugTextRenderer, PickedPixel, RenderConfig, RenderOrchestrator, Renderer};
use pickview_scene::Scene;
use pickview_scene::demo::build_demo_scene;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pickview-cli", about = "Headless inspection of the pickview demo scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML render config; defaults are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info and the effective config
    Info,
    /// Plan frames of the demo scene and print the last plan
    Plan {
        /// Frames to run before printing
        #[arg(short, long, default_value = "1")]
        frames: u64,
        /// List every instance draw
        #[arg(long)]
        instances: bool,
        #[arg(long)]
        wireframe: bool,
        #[arg(long)]
        flat: bool,
        #[arg(long)]
        no_cull: bool,
    },
    /// Apply camera actions in order and print the camera after each
    Camera {
        /// e.g. orbit-h:90 orbit-v:-10 zoom:2 pan:0.1,0,0 reset next prev
        #[arg(value_parser = parse_action, num_args = 1..)]
        actions: Vec<Action>,
    },
    /// Render one frame, then resolve a pick against it
    Pick {
        /// Object id as read from the pick texture
        #[arg(long, conflicts_with = "at")]
        object_id: Option<u32>,
        /// Window point for a ray pick, as X,Y
        #[arg(long, value_parser = parse_point)]
        at: Option<Vec2>,
        /// Run the picked entity's action
        #[arg(long)]
        trigger: bool,
    },
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z, got {s:?}")),
    }
}

fn parse_point(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x = x.trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f32>().map_err(|e| e.to_string())?;
    Ok(Vec2::new(x, y))
}

fn parse_action(s: &str) -> Result<Action, String> {
    let (name, arg) = match s.split_once(':') {
        Some((name, arg)) => (name, Some(arg)),
        None => (s, None),
    };
    let amount = || -> Result<f32, String> {
        arg.ok_or_else(|| format!("{name} needs an amount"))?
            .parse::<f32>()
            .map_err(|e| format!("{name}: {e}"))
    };
    match name {
        "orbit-h" => Ok(Action::OrbitHorizontal(amount()?)),
        "orbit-v" => Ok(Action::OrbitVertical(amount()?)),
        "zoom" => Ok(Action::Zoom(amount()?)),
        "pan" => Ok(Action::Pan(parse_vec3(
            arg.ok_or_else(|| "pan needs x,y,z".to_string())?,
        )?)),
        "reset" => Ok(Action::ResetCamera),
        "next" => Ok(Action::NextCamera),
        "prev" => Ok(Action::PreviousCamera),
        other => Err(format!("unknown camera action {other:?}")),
    }
}

fn demo(config: &RenderConfig) -> Result<(Scene, RenderOrchestrator)> {
    let mut loader = HeadlessLoader::new();
    let mut scene = build_demo_scene(&mut loader)?;
    scene.sky_colour = Vec3::from_array(config.sky_colour);
    let viewport = Viewport::new(config.window.width, config.window.height);
    Ok((scene, RenderOrchestrator::new(config, viewport)))
}

fn run_frame(scene: &mut Scene, orch: &mut RenderOrchestrator) -> pickview_render::FramePlan {
    scene.step();
    orch.submit_scene(scene);
    let plan = orch.plan_frame(scene);
    orch.finish_frame();
    plan
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = RenderConfig::load_or_default(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Info => {
            println!("pickview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", pickview_render::crate_info());
            print!("{}", config.to_yaml()?);
        }
        Commands::Plan {
            frames,
            instances,
            wireframe,
            flat,
            no_cull,
        } => {
            let (mut scene, mut orch) = demo(&config)?;
            let toggles = orch.toggles_mut();
            toggles.set_wireframe(wireframe);
            toggles.set_culling(!no_cull);
            if flat {
                toggles.enable_flat_shading();
            }
            let mut plan = None;
            for _ in 0..frames.max(1) {
                plan = Some(run_frame(&mut scene, &mut orch));
            }
            let Some(plan) = plan else {
                bail!("no frame planned");
            };
            if cli.json {
                let groups: Vec<_> = plan
                    .groups
                    .iter()
                    .map(|g| {
                        json!({
                            "model": g.key.model.0,
                            "texture": g.key.texture.0,
                            "cull": g.cull_back_faces,
                            "object_ids": plan
                                .group_instances(g)
                                .iter()
                                .map(|d| d.object_index)
                                .collect::<Vec<_>>(),
                        })
                    })
                    .collect();
                let out = json!({
                    "frame": plan.frame,
                    "viewport": [plan.viewport.width, plan.viewport.height],
                    "pick": plan.pick_enabled,
                    "lights": plan.lights.used,
                    "groups": groups,
                    "terrains": plan.terrains.len(),
                    "pick_sequence": plan.pick_index_sequence(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                let mut renderer = DebugTextRenderer { verbose: instances };
                print!("{}", renderer.render(&plan));
            }
        }
        Commands::Camera { actions } => {
            let (mut scene, mut orch) = demo(&config)?;
            let mut states = vec![scene.camera().state()];
            for action in &actions {
                pickview_input::apply(*action, &mut scene, orch.toggles_mut());
                states.push(scene.camera().state());
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&states)?);
            } else {
                for (step, state) in states.iter().enumerate() {
                    let label = match step {
                        0 => "start".to_string(),
                        n => format!("{:?}", actions[n - 1]),
                    };
                    let p = state.position;
                    println!(
                        "{label}: pos=({:.3}, {:.3}, {:.3}) h={:.1} v={:.1} zoom={:.2}",
                        p.x, p.y, p.z, state.horizontal_angle, state.vertical_angle, state.zoom
                    );
                }
            }
        }
        Commands::Pick {
            object_id,
            at,
            trigger,
        } => {
            let (mut scene, mut orch) = demo(&config)?;
            run_frame(&mut scene, &mut orch);
            let hit = match (object_id, at) {
                (Some(id), _) => orch
                    .resolve_pick(PickedPixel {
                        object_id: id,
                        draw_id: 0,
                        prim_id: 0,
                    })
                    .map(|i| (i.entity, None)),
                (None, Some(point)) => orch
                    .ray_pick(&scene, point)
                    .map(|(entity, t)| (entity, Some(t))),
                (None, None) => bail!("pass --object-id or --at"),
            };
            let Some((entity, distance)) = hit else {
                if cli.json {
                    println!("{}", json!({ "hit": false }));
                } else {
                    println!("background");
                }
                return Ok(());
            };
            let action = if trigger {
                scene.trigger(entity).map(|a| format!("{a:?}"))
            } else {
                None
            };
            if cli.json {
                let out = json!({
                    "hit": true,
                    "entity": entity.0.to_string(),
                    "distance": distance,
                    "action": action,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("hit {}", entity.short());
                if let Some(t) = distance {
                    print!(" at distance {t:.3}");
                }
                if let Some(action) = action {
                    print!(", ran {action}");
                }
                println!();
            }
        }
    }

    Ok(())
}
