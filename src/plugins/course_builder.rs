// Voxel course building: holes are stamped into a sparse block grid, then every
// block becomes a fixed collider (and a cube mesh when rendering is available).
use bevy::prelude::*;
use bevy::math::primitives::Cuboid;
use bevy_rapier3d::prelude::*;
use noise::{NoiseFn, Perlin};
use std::collections::HashMap;

use crate::plugins::ball::{BALL_GROUP, COURSE_GROUP};
use crate::plugins::course::{CourseDef, FeatureDef, HoleDef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Grass,
    GrassDark,
    Tee,
    Wall,
    Sand,
    Water,
    Ice,
    Base,
}

impl BlockKind {
    pub fn is_solid(self) -> bool {
        !matches!(self, BlockKind::Water)
    }

    /// Rapier (friction, restitution) per surface.
    pub fn contact(self) -> (f32, f32) {
        match self {
            BlockKind::Grass | BlockKind::GrassDark | BlockKind::Tee => (0.7, 0.3),
            BlockKind::Wall => (0.3, 0.75),
            BlockKind::Sand => (1.0, 0.05),
            BlockKind::Ice => (0.02, 0.2),
            BlockKind::Base => (0.9, 0.1),
            BlockKind::Water => (0.0, 0.0),
        }
    }

    fn color(self) -> Color {
        match self {
            BlockKind::Grass => Color::srgb(0.30, 0.68, 0.28),
            BlockKind::GrassDark => Color::srgb(0.24, 0.58, 0.22),
            BlockKind::Tee => Color::srgb(0.55, 0.80, 0.45),
            BlockKind::Wall => Color::srgb(0.55, 0.38, 0.22),
            BlockKind::Sand => Color::srgb(0.90, 0.82, 0.55),
            BlockKind::Water => Color::srgba(0.15, 0.40, 0.85, 0.7),
            BlockKind::Ice => Color::srgb(0.75, 0.90, 0.98),
            BlockKind::Base => Color::srgb(0.20, 0.20, 0.22),
        }
    }
}

/// Sparse voxel lattice, one unit cube per cell.
#[derive(Resource, Debug, Default, Clone)]
pub struct BlockGrid {
    blocks: HashMap<IVec3, BlockKind>,
}

impl BlockGrid {
    pub fn set(&mut self, pos: IVec3, kind: BlockKind) {
        self.blocks.insert(pos, kind);
    }

    pub fn get(&self, pos: IVec3) -> Option<BlockKind> {
        self.blocks.get(&pos).copied()
    }

    pub fn remove(&mut self, pos: IVec3) -> Option<BlockKind> {
        self.blocks.remove(&pos)
    }

    /// Fills the inclusive box `min..=max`.
    pub fn fill_box(&mut self, min: IVec3, max: IVec3, kind: BlockKind) {
        let lo = min.min(max);
        let hi = min.max(max);
        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    self.set(IVec3::new(x, y, z), kind);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IVec3, BlockKind)> + '_ {
        self.blocks.iter().map(|(p, k)| (*p, *k))
    }

    pub fn count(&self, kind: BlockKind) -> usize {
        self.blocks.values().filter(|k| **k == kind).count()
    }

    pub fn bounds(&self) -> Option<(IVec3, IVec3)> {
        let mut it = self.blocks.keys();
        let first = *it.next()?;
        Some(it.fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))))
    }
}

pub fn block_center(pos: IVec3) -> Vec3 {
    pos.as_vec3() + Vec3::splat(0.5)
}

pub fn block_at(point: Vec3) -> IVec3 {
    point.floor().as_ivec3()
}

/// Kind of the first block found directly below `pos` within `reach` cells.
pub fn surface_below(grid: &BlockGrid, pos: Vec3, reach: i32) -> Option<BlockKind> {
    let cell = block_at(pos);
    (0..=reach).find_map(|d| grid.get(cell - IVec3::Y * d))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoleLayout {
    pub origin: IVec3,
    /// Ball spawn point above the tee block.
    pub tee: Vec3,
    pub cup: Vec3,
    pub cup_block: IVec3,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct CourseLayout {
    pub holes: Vec<HoleLayout>,
    pub min: Vec3,
    pub max: Vec3,
    pub kill_y: f32,
}

impl CourseLayout {
    pub fn hole(&self, index: usize) -> Option<&HoleLayout> {
        self.holes.get(index)
    }

    pub fn contains_xz(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.z && p.z <= self.max.z
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct CourseBlock {
    pub kind: BlockKind,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct HoleCup {
    pub hole: usize,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct WaterHazard;

const OUT_OF_BOUNDS_MARGIN: f32 = 2.0;

fn feature_rect(hole: &HoleDef, min: (i32, i32), max: (i32, i32)) -> Option<(IVec2, IVec2)> {
    let lo = IVec2::new(min.0.min(max.0), min.1.min(max.1)).max(IVec2::ZERO);
    let hi = IVec2::new(min.0.max(max.0), min.1.max(max.1))
        .min(IVec2::new(hole.size.0 - 1, hole.size.1 - 1));
    (lo.x <= hi.x && lo.y <= hi.y).then_some((lo, hi))
}

pub fn stamp_hole(grid: &mut BlockGrid, hole: &HoleDef, noise: &Perlin, ball_radius: f32) -> HoleLayout {
    let origin = IVec3::new(hole.origin.0, hole.origin.1, hole.origin.2);
    let (w, l) = hole.size;
    let tee_cell = IVec2::new(hole.tee.0, hole.tee.1);
    let cup_cell = IVec2::new(hole.cup.0, hole.cup.1);

    // Fairway floor
    for x in 0..w {
        for z in 0..l {
            let p = origin + IVec3::new(x, 0, z);
            let shade = noise.get([p.x as f64 * 0.23, p.z as f64 * 0.23]);
            grid.set(p, if shade > 0.12 { BlockKind::GrassDark } else { BlockKind::Grass });
        }
    }

    // Perimeter rim + walls
    for x in -1..=w {
        for z in -1..=l {
            if x != -1 && x != w && z != -1 && z != l {
                continue;
            }
            for y in 0..=hole.wall_height {
                grid.set(origin + IVec3::new(x, y, z), BlockKind::Wall);
            }
        }
    }

    let protected = |x: i32, z: i32| {
        let c = IVec2::new(x, z);
        c == tee_cell || c == cup_cell
    };

    for feature in &hole.features {
        let (min, max, kind) = match *feature {
            FeatureDef::Wall { min, max, .. } => (min, max, BlockKind::Wall),
            FeatureDef::Sand { min, max } => (min, max, BlockKind::Sand),
            FeatureDef::Water { min, max } => (min, max, BlockKind::Water),
            FeatureDef::Ice { min, max } => (min, max, BlockKind::Ice),
            FeatureDef::Gap { min, max } => (min, max, BlockKind::Base),
        };
        let Some((lo, hi)) = feature_rect(hole, min, max) else { continue; };
        for x in lo.x..=hi.x {
            for z in lo.y..=hi.y {
                if protected(x, z) {
                    continue;
                }
                let floor = origin + IVec3::new(x, 0, z);
                match *feature {
                    FeatureDef::Wall { height, .. } => {
                        for y in 1..=height.max(1) {
                            grid.set(floor + IVec3::Y * y, BlockKind::Wall);
                        }
                    }
                    FeatureDef::Water { .. } => {
                        grid.set(floor, BlockKind::Water);
                        grid.set(floor - IVec3::Y, BlockKind::Base);
                    }
                    FeatureDef::Gap { .. } => {
                        grid.remove(floor);
                    }
                    _ => grid.set(floor, kind),
                }
            }
        }
    }

    // Tee & cup
    let tee_block = origin + IVec3::new(tee_cell.x, 0, tee_cell.y);
    grid.set(tee_block, BlockKind::Tee);
    let cup_block = origin + IVec3::new(cup_cell.x, 0, cup_cell.y);
    grid.remove(cup_block);
    grid.set(cup_block - IVec3::Y, BlockKind::Base);

    let tee_center = block_center(tee_block);
    HoleLayout {
        origin,
        tee: Vec3::new(tee_center.x, tee_block.y as f32 + 1.0 + ball_radius + 0.02, tee_center.z),
        cup: block_center(cup_block),
        cup_block,
    }
}

pub fn build_layout(course: &CourseDef) -> (BlockGrid, CourseLayout) {
    let noise = Perlin::new(course.seed);
    let mut grid = BlockGrid::default();
    let holes: Vec<HoleLayout> = course
        .holes
        .iter()
        .map(|h| stamp_hole(&mut grid, h, &noise, course.ball.radius))
        .collect();
    let (min, max) = grid
        .bounds()
        .map(|(lo, hi)| (lo.as_vec3(), (hi + IVec3::ONE).as_vec3()))
        .unwrap_or((Vec3::ZERO, Vec3::ZERO));
    let layout = CourseLayout {
        holes,
        min: min - Vec3::splat(OUT_OF_BOUNDS_MARGIN),
        max: max + Vec3::splat(OUT_OF_BOUNDS_MARGIN),
        kill_y: min.y - course.kill_depth,
    };
    (grid, layout)
}

// ----------------------- Plugin -----------------------

pub struct CourseBuilderPlugin;
impl Plugin for CourseBuilderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Startup,
            (build_course, spawn_course)
                .chain()
                .after(crate::plugins::course::load_course),
        );
    }
}

fn build_course(mut commands: Commands, course: Option<Res<CourseDef>>) {
    let Some(course) = course else { return; };
    let (grid, layout) = build_layout(&course);
    info!(
        "COURSE built blocks={} holes={} kill_y={:.1}",
        grid.len(),
        layout.holes.len(),
        layout.kill_y
    );
    commands.insert_resource(grid);
    commands.insert_resource(layout);
}

fn spawn_course(
    mut commands: Commands,
    grid: Option<Res<BlockGrid>>,
    layout: Option<Res<CourseLayout>>,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    let (Some(grid), Some(layout)) = (grid, layout) else { return; };

    // Render handles only exist when the PBR stack is present (not in headless tests).
    let render = match (meshes, materials) {
        (Some(mut meshes), Some(mut materials)) => {
            let cube = meshes.add(Mesh::from(Cuboid::new(1.0, 1.0, 1.0)));
            let mut by_kind: HashMap<BlockKind, Handle<StandardMaterial>> = HashMap::new();
            for (_, kind) in grid.iter() {
                by_kind.entry(kind).or_insert_with(|| {
                    let color = kind.color();
                    materials.add(StandardMaterial {
                        base_color: color,
                        perceptual_roughness: 0.9,
                        alpha_mode: if kind == BlockKind::Water { AlphaMode::Blend } else { AlphaMode::Opaque },
                        ..default()
                    })
                });
            }
            Some((cube, by_kind))
        }
        _ => None,
    };

    for (pos, kind) in grid.iter() {
        let transform = Transform::from_translation(block_center(pos));
        let mut ec = commands.spawn((
            SpatialBundle::from_transform(transform),
            CourseBlock { kind },
            RigidBody::Fixed,
            Collider::cuboid(0.5, 0.5, 0.5),
            CollisionGroups::new(COURSE_GROUP, BALL_GROUP),
        ));
        if kind.is_solid() {
            let (friction, restitution) = kind.contact();
            ec.insert((Friction::coefficient(friction), Restitution::coefficient(restitution)));
        } else {
            ec.insert((Sensor, WaterHazard));
        }
        if let Some((cube, by_kind)) = &render {
            if let Some(mat) = by_kind.get(&kind) {
                ec.insert((cube.clone(), mat.clone()));
            }
        }
    }

    for (index, hole) in layout.holes.iter().enumerate() {
        commands.spawn((
            SpatialBundle::from_transform(Transform::from_translation(hole.cup - Vec3::Y * 0.1)),
            HoleCup { hole: index },
            RigidBody::Fixed,
            Collider::cuboid(0.3, 0.3, 0.3),
            CollisionGroups::new(COURSE_GROUP, BALL_GROUP),
            Sensor,
        ));
    }
}
