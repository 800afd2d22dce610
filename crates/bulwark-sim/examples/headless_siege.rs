//! Headless siege -- a turret defends a waypoint road against a rock volley.
//!
//! Run with:
//!   cargo run --example headless_siege -p bulwark-sim [config.json] [--rapier]
//!
//! The optional JSON file is a `SimConfig`; missing sections use defaults.
//! Set `RUST_LOG=bulwark_sim=debug` to see task switches and intercepts.

use anyhow::Context;
use bulwark_sim::prelude::*;
use tracing::info;

const TICKS: u64 = 600;

fn spawn(world: &mut World, builder: ObjectBuilder) -> anyhow::Result<ObjectId> {
    let id = world.create(builder)?;
    world.register(id);
    Ok(id)
}

fn build_world(config: &SimConfig) -> anyhow::Result<World> {
    let mut world = World::new();

    let mut road = Vec::new();
    for point in [
        Vec2::new(-8.0, 0.0),
        Vec2::new(-2.0, 0.0),
        Vec2::new(-2.0, 5.0),
        Vec2::new(6.0, 5.0),
    ] {
        road.push(spawn(&mut world, ObjectBuilder::new("waypoint").at(point))?);
    }

    let mut orcs = Vec::new();
    for i in 0..3 {
        let orc = spawn(
            &mut world,
            ObjectBuilder::new("orc")
                .at(Vec2::new(-10.0 - 2.0 * i as f64, 0.0))
                .component(WaypointComponent::new(road.clone(), Vec2::new(1.2, 1.2))?)
                .component(
                    TaskScheduler::new()
                        .with_task(WaypointTask::new(config.path.priority, 0.1)?),
                ),
        )?;
        world.add_listener(orc, names::PATH_COMPLETE, move |ctx, _payload| {
            info!(orc = %ctx.id(), "orc reached the gate");
            Ok(())
        });
        orcs.push(orc);
    }

    let guard = TaskScheduler::new()
        .with_task(ChaseTask::new(orcs.first().copied(), config.chase.clone())?)
        .with_task(PatrolTask::new(config.patrol.clone())?);
    let knight = spawn(
        &mut world,
        ObjectBuilder::new("knight")
            .at(Vec2::new(0.0, 8.0))
            .component(guard),
    )?;
    world.add_listener(knight, names::CHASE_START, |ctx, payload| {
        info!(knight = %ctx.id(), ?payload, "knight gives chase");
        Ok(())
    });

    spawn(
        &mut world,
        ObjectBuilder::new("turret")
            .at(Vec2::new(0.0, 2.0))
            .component(AntiProjectileShooterComponent::new(config.shooter.clone())?),
    )?;

    for i in 0..8 {
        let from = Vec2::new(12.0, -3.0 + i as f64);
        let direction = Vec2::new(0.0, 2.0) - from;
        spawn(
            &mut world,
            ObjectBuilder::new("rock")
                .at(from)
                .pool_key("rock")
                .body(Body::new(ColliderShape::Circle { radius: 0.3 }).with_layers(0b10, 0b01))
                .component(ProjectileComponent::from_config(direction, &config.projectile)?),
        )?;
    }

    Ok(world)
}

fn main() -> anyhow::Result<()> {
    bulwark_sim::init_tracing();

    let mut config_path = None;
    let mut use_rapier = false;
    for arg in std::env::args().skip(1) {
        if arg == "--rapier" {
            use_rapier = true;
        } else {
            config_path = Some(arg);
        }
    }

    let config = match config_path {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            SimConfig::from_json(&json).with_context(|| format!("parsing config {path}"))?
        }
        None => SimConfig::default(),
    };

    let world = build_world(&config)?;
    let tick_loop = TickLoop::new(world, config.tick.clone())?;
    let mut tick_loop = if use_rapier {
        tick_loop.with_physics(RapierPhysics::new())
    } else {
        tick_loop.with_physics(KinematicPhysics::new())
    };

    let applied = tick_loop.run_ticks(TICKS);
    let world = tick_loop.world();
    info!(
        ticks = tick_loop.tick_count(),
        sim_time = tick_loop.sim_time(),
        physics = tick_loop.physics_name().unwrap_or("none"),
        commands = applied,
        live = world.live_count(),
        rocks_pooled = world.pooled_count("rock"),
        interceptors_pooled = world.pooled_count(INTERCEPTOR_POOL),
        digest = %tick_loop.state_digest(),
        "siege finished"
    );
    Ok(())
}
