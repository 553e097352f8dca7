use escape_block_core::{CellCode, Grid, GridVec, Vec2D};
use escape_block_system_raycasting::{Axis, RayCaster, RayError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const EAST: Vec2D = Vec2D::new(1.0, 0.0);
const SOUTH: Vec2D = Vec2D::new(0.0, 1.0);
const CAMERA_PLANE: Vec2D = Vec2D::new(0.0, 0.66);

fn grid_with_walls(size: u32, walls: &[GridVec]) -> Grid {
    let mut grid = Grid::bordered(size);
    for wall in walls {
        grid.set(*wall, CellCode::Wall).expect("interior cell");
    }
    grid
}

#[test]
fn centre_ray_reaches_wall_three_and_a_half_cells_away() {
    let grid = grid_with_walls(10, &[GridVec::new(5, 1)]);
    let caster = RayCaster::new(&grid, Vec2D::new(1.5, 1.5), EAST, CAMERA_PLANE)
        .expect("valid camera");

    let hit = caster.cast_at(0.0);

    assert!((hit.distance() - 3.5).abs() < 1e-12);
    assert_eq!(hit.axis(), Axis::X);
    assert_eq!(hit.cell(), CellCode::Wall);
    assert_eq!(hit.map_cell(), GridVec::new(5, 1));
    assert_eq!(hit.steps(), 4);

    let centre_column = caster.columns(4).nth(2).expect("four columns");
    assert_eq!(centre_column, hit);
}

#[test]
fn axis_aligned_rays_have_finite_distances() {
    let grid = grid_with_walls(10, &[]);
    let caster = RayCaster::new(&grid, Vec2D::new(1.5, 1.5), SOUTH, Vec2D::new(-0.66, 0.0))
        .expect("valid camera");

    let hit = caster.cast_at(0.0);

    assert!(hit.distance().is_finite());
    assert!((hit.distance() - 7.5).abs() < 1e-12);
    assert_eq!(hit.axis(), Axis::Y);
    assert_eq!(hit.map_cell(), GridVec::new(1, 9));
}

#[test]
fn diagonal_ties_step_along_y_first() {
    let grid = grid_with_walls(10, &[]);
    let caster = RayCaster::new(&grid, Vec2D::new(1.5, 1.5), Vec2D::new(1.0, 1.0), CAMERA_PLANE)
        .expect("valid camera");

    let hit = caster.cast_at(0.0);

    assert_eq!(hit.axis(), Axis::Y);
    assert_eq!(hit.map_cell(), GridVec::new(8, 9));
    assert!((hit.distance() - 7.5).abs() < 1e-12);
}

#[test]
fn chaser_cells_stop_the_ray() {
    let mut grid = grid_with_walls(10, &[]);
    grid.set(GridVec::new(3, 1), CellCode::Chaser)
        .expect("interior cell");
    let caster = RayCaster::new(&grid, Vec2D::new(1.5, 1.5), EAST, CAMERA_PLANE)
        .expect("valid camera");

    let hit = caster.cast_at(0.0);

    assert_eq!(hit.cell(), CellCode::Chaser);
    assert!((hit.distance() - 1.5).abs() < 1e-12);
}

#[test]
fn flat_wall_has_equal_distance_in_every_column() {
    let walls: Vec<GridVec> = (1..9).map(|row| GridVec::new(5, row)).collect();
    let grid = grid_with_walls(10, &walls);
    let caster = RayCaster::new(&grid, Vec2D::new(1.5, 4.5), EAST, CAMERA_PLANE)
        .expect("valid camera");

    for hit in caster.columns(6) {
        assert_eq!(hit.axis(), Axis::X);
        assert_eq!(hit.map_cell().x(), 5);
        assert!((hit.distance() - 3.5).abs() < 1e-9);
    }
}

#[test]
fn columns_are_lazy_finite_and_restartable() {
    let grid = grid_with_walls(12, &[GridVec::new(6, 3), GridVec::new(4, 8)]);
    let caster = RayCaster::new(&grid, Vec2D::new(5.5, 5.5), Vec2D::new(0.6, 0.8), Vec2D::new(-0.56, 0.42))
        .expect("valid camera");

    let mut columns = caster.columns(16);
    assert_eq!(columns.len(), 16);
    let _ = columns.next();
    let _ = columns.next();
    let resumed: Vec<_> = columns.clone().collect();
    let rest: Vec<_> = columns.collect();
    assert_eq!(resumed, rest);
    assert_eq!(rest.len(), 14);

    let first: Vec<_> = caster.columns(16).collect();
    let second: Vec<_> = caster.columns(16).collect();
    assert_eq!(first, second);
    assert_eq!(caster.columns(0).count(), 0);
}

#[test]
fn rays_terminate_within_twice_the_grid_size() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x7a7c_0dda);
    let size = 16u32;

    for _ in 0..50 {
        let mut grid = Grid::bordered(size);
        let interior: Vec<GridVec> = grid.interior_cells().collect();
        for cell in interior {
            if rng.gen_bool(0.1) {
                grid.set(cell, CellCode::Wall).expect("interior cell");
            }
        }

        let position = Vec2D::new(rng.gen_range(1.0..15.0), rng.gen_range(1.0..15.0));
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        let direction = Vec2D::new(1.0, 0.0).rotated(angle);
        let viewport = direction.rotated(-std::f64::consts::FRAC_PI_2) * 0.7;
        let caster = RayCaster::new(&grid, position, direction, viewport).expect("valid camera");

        for hit in caster.columns(64) {
            assert!(hit.steps() <= 2 * size, "ray took {} steps", hit.steps());
            assert!(hit.distance().is_finite());
            assert!(hit.distance() >= 0.0);
            assert_ne!(hit.cell(), CellCode::Empty);
        }
    }
}

#[test]
fn degenerate_cameras_are_rejected() {
    let grid = grid_with_walls(10, &[]);
    let position = Vec2D::new(2.5, 2.5);

    assert_eq!(
        RayCaster::new(&grid, position, Vec2D::ZERO, CAMERA_PLANE).err(),
        Some(RayError::DegenerateView)
    );
    assert_eq!(
        RayCaster::new(&grid, position, EAST, Vec2D::new(2.0, 0.0)).err(),
        Some(RayError::DegenerateView)
    );
    assert_eq!(
        RayCaster::new(&grid, Vec2D::new(10.5, 2.0), EAST, CAMERA_PLANE).err(),
        Some(RayError::OutOfBounds { x: 10.5, y: 2.0 })
    );
    assert!(matches!(
        RayCaster::new(&grid, Vec2D::new(-0.1, 2.0), EAST, CAMERA_PLANE),
        Err(RayError::OutOfBounds { .. })
    ));
}
