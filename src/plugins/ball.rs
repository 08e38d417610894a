// Golf ball bodies: physics tuning, rest detection, hazards & collision routing.
// Simulation itself is Rapier's; this module tunes bodies and turns contacts into
// gameplay events.
use bevy::prelude::*;
use bevy::math::primitives::Sphere;
use bevy_rapier3d::prelude::*;
use serde::Deserialize;

use crate::plugins::core_sim::GolfSet;
use crate::plugins::course::apply_course_tuning;
use crate::plugins::course_builder::{surface_below, BlockGrid, BlockKind, CourseBlock, CourseLayout, HoleCup, WaterHazard};
use crate::plugins::events::{BallHazardEvent, BallImpactEvent, BallInCupEvent, BallStoppedEvent, Hazard};
use crate::plugins::game_state::PlayerId;

#[derive(Resource, Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct BallTuning {
    pub radius: f32,
    pub mass: f32,
    pub restitution: f32,
    pub friction: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Linear damping while rolling over sand / ice.
    pub sand_damping: f32,
    pub ice_damping: f32,
    pub gravity_scale: f32,
    pub rest_speed: f32,
    pub rest_secs: f32,
    pub min_roll_secs: f32,
    pub max_roll_secs: f32,
    pub ccd: bool,
}

impl Default for BallTuning {
    fn default() -> Self {
        Self {
            radius: 0.2,
            mass: 0.045,
            restitution: 0.45,
            friction: 0.6,
            linear_damping: 0.55,
            angular_damping: 0.9,
            sand_damping: 3.5,
            ice_damping: 0.05,
            gravity_scale: 1.0,
            rest_speed: 0.08,
            rest_secs: 0.5,
            min_roll_secs: 0.25,
            max_roll_secs: 20.0,
            ccd: true,
        }
    }
}

impl BallTuning {
    pub fn damping_for(&self, surface: Option<BlockKind>) -> f32 {
        match surface {
            Some(BlockKind::Sand) => self.sand_damping,
            Some(BlockKind::Ice) => self.ice_damping,
            _ => self.linear_damping,
        }
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct GolfBall {
    pub owner: PlayerId,
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct BallMotion {
    pub in_flight: bool,
    pub flight_secs: f32,
    pub rest_secs: f32,
    pub last_rest: Vec3,
}

impl BallMotion {
    pub fn at_rest(position: Vec3) -> Self {
        Self { last_rest: position, ..default() }
    }

    pub fn launch(&mut self) {
        self.in_flight = true;
        self.flight_secs = 0.0;
        self.rest_secs = 0.0;
    }

    /// Advances rest detection; true when the ball should be declared stopped.
    pub fn step(&mut self, dt: f32, speed: f32, tuning: &BallTuning) -> bool {
        if !self.in_flight {
            return false;
        }
        self.flight_secs += dt;
        if self.flight_secs >= tuning.max_roll_secs {
            return true;
        }
        if self.flight_secs < tuning.min_roll_secs {
            return false;
        }
        if speed < tuning.rest_speed {
            self.rest_secs += dt;
        } else {
            self.rest_secs = 0.0;
        }
        self.rest_secs >= tuning.rest_secs
    }
}

/// Marks the ball the camera follows.
#[derive(Component, Debug, Clone, Copy)]
pub struct ActiveBall;

// Balls only collide with the course.
pub const BALL_GROUP: Group = Group::GROUP_2;
pub const COURSE_GROUP: Group = Group::GROUP_1;

#[derive(Resource)]
pub struct BallRender {
    mesh: Handle<Mesh>,
    material: Handle<StandardMaterial>,
}

pub fn spawn_ball(
    commands: &mut Commands,
    owner: PlayerId,
    position: Vec3,
    tuning: &BallTuning,
    render: Option<&BallRender>,
) -> Entity {
    let mut ec = commands.spawn((
        SpatialBundle::from_transform(Transform::from_translation(position)),
        GolfBall { owner },
        BallMotion::at_rest(position),
        RigidBody::Dynamic,
        Collider::ball(tuning.radius),
        ColliderMassProperties::Mass(tuning.mass),
        Restitution::coefficient(tuning.restitution),
        Friction::coefficient(tuning.friction),
        Damping { linear_damping: tuning.linear_damping, angular_damping: tuning.angular_damping },
        GravityScale(tuning.gravity_scale),
        Velocity::zero(),
        ExternalImpulse::default(),
        ActiveEvents::COLLISION_EVENTS,
        CollisionGroups::new(BALL_GROUP, COURSE_GROUP),
    ));
    if tuning.ccd {
        ec.insert(Ccd::enabled());
    }
    if let Some(render) = render {
        ec.insert((render.mesh.clone(), render.material.clone()));
    }
    ec.id()
}

/// Puts a ball back where it last came to rest.
pub fn reset_ball(transform: &mut Transform, velocity: &mut Velocity, motion: &mut BallMotion) {
    transform.translation = motion.last_rest;
    transform.rotation = Quat::IDENTITY;
    *velocity = Velocity::zero();
    motion.in_flight = false;
    motion.flight_secs = 0.0;
    motion.rest_secs = 0.0;
}

pub struct BallPlugin;
impl Plugin for BallPlugin {
    fn build(&self, app: &mut App) {
        // Registered by Rapier too; keeps headless apps without the physics plugin valid.
        app.add_event::<CollisionEvent>()
            .init_resource::<BallTuning>()
            .add_systems(Startup, load_ball_render.after(apply_course_tuning))
            .add_systems(
                Update,
                (route_collisions, detect_out_of_bounds, apply_surface_damping, track_ball_rest)
                    .chain()
                    .in_set(GolfSet::Ball),
            );
    }
}

fn load_ball_render(
    mut commands: Commands,
    tuning: Res<BallTuning>,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    let (Some(mut meshes), Some(mut materials)) = (meshes, materials) else { return; };
    commands.insert_resource(BallRender {
        mesh: meshes.add(Mesh::from(Sphere { radius: tuning.radius })),
        material: materials.add(StandardMaterial {
            base_color: Color::srgb(0.97, 0.97, 0.95),
            perceptual_roughness: 0.35,
            ..default()
        }),
    });
}

fn track_ball_rest(
    time: Res<Time>,
    tuning: Res<BallTuning>,
    mut q: Query<(&GolfBall, &Transform, &mut Velocity, &mut BallMotion)>,
    mut ev_stopped: EventWriter<BallStoppedEvent>,
) {
    let dt = time.delta_seconds();
    for (ball, t, mut vel, mut motion) in &mut q {
        if !motion.step(dt, vel.linvel.length(), &tuning) {
            continue;
        }
        if motion.flight_secs >= tuning.max_roll_secs {
            warn!("BALL forced stop player={} after={:.1}s", ball.owner, motion.flight_secs);
        }
        *vel = Velocity::zero();
        motion.in_flight = false;
        motion.last_rest = t.translation;
        ev_stopped.send(BallStoppedEvent { player: ball.owner, position: t.translation });
    }
}

fn detect_out_of_bounds(
    layout: Option<Res<CourseLayout>>,
    q: Query<(&GolfBall, &Transform, &BallMotion)>,
    mut ev_hazard: EventWriter<BallHazardEvent>,
) {
    let Some(layout) = layout else { return; };
    for (ball, t, motion) in &q {
        if !motion.in_flight {
            continue;
        }
        let p = t.translation;
        if p.y < layout.kill_y || !layout.contains_xz(p) {
            ev_hazard.send(BallHazardEvent { player: ball.owner, hazard: Hazard::OutOfBounds });
        }
    }
}

fn apply_surface_damping(
    tuning: Res<BallTuning>,
    grid: Option<Res<BlockGrid>>,
    mut q: Query<(&Transform, &BallMotion, &mut Damping), With<GolfBall>>,
) {
    let Some(grid) = grid else { return; };
    for (t, motion, mut damping) in &mut q {
        if !motion.in_flight {
            continue;
        }
        let surface = surface_below(&grid, t.translation - Vec3::Y * tuning.radius, 1);
        let want = tuning.damping_for(surface);
        if (damping.linear_damping - want).abs() > f32::EPSILON {
            damping.linear_damping = want;
        }
    }
}

fn route_collisions(
    mut ev_collisions: EventReader<CollisionEvent>,
    q_ball: Query<(&GolfBall, &Transform, &Velocity, &BallMotion)>,
    q_cup: Query<&HoleCup>,
    q_water: Query<(), With<WaterHazard>>,
    q_block: Query<&CourseBlock>,
    mut ev_cup: EventWriter<BallInCupEvent>,
    mut ev_hazard: EventWriter<BallHazardEvent>,
    mut ev_impact: EventWriter<BallImpactEvent>,
) {
    for ev in ev_collisions.read() {
        let CollisionEvent::Started(a, b, _) = *ev else { continue; };
        let (ball_e, other) = if q_ball.contains(a) {
            (a, b)
        } else if q_ball.contains(b) {
            (b, a)
        } else {
            continue;
        };
        let Ok((ball, t, vel, motion)) = q_ball.get(ball_e) else { continue; };
        if !motion.in_flight {
            continue;
        }
        if let Ok(cup) = q_cup.get(other) {
            ev_cup.send(BallInCupEvent { player: ball.owner, hole: cup.hole });
        } else if q_water.contains(other) {
            ev_hazard.send(BallHazardEvent { player: ball.owner, hazard: Hazard::Water });
        } else if q_block.contains(other) {
            ev_impact.send(BallImpactEvent { pos: t.translation, intensity: vel.linvel.length() });
        }
    }
}
