use std::collections::{HashMap, VecDeque};

use escape_block_core::{CellCode, CellLookup, Grid, GridVec};
use escape_block_system_pathfinding::{PathFinder, SearchStrategy};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn walled_column_grid() -> Grid {
    let mut grid = Grid::bordered(10);
    for row in 1..9 {
        grid.set(GridVec::new(5, row), CellCode::Wall)
            .expect("interior cell");
    }
    grid
}

fn random_grid(rng: &mut ChaCha8Rng, size: u32, wall_probability: f64) -> Grid {
    let mut grid = Grid::bordered(size);
    let interior: Vec<GridVec> = grid.interior_cells().collect();
    for cell in interior {
        if rng.gen_bool(wall_probability) {
            grid.set(cell, CellCode::Wall).expect("interior cell");
        }
    }
    grid
}

fn reference_distance(grid: &Grid, from: GridVec, to: GridVec) -> Option<usize> {
    let mut distances = HashMap::from([(from, 0usize)]);
    let mut queue = VecDeque::from([from]);

    while let Some(cell) = queue.pop_front() {
        let distance = distances[&cell];
        if cell == to {
            return Some(distance);
        }
        for neighbor in cell.neighbors() {
            let open = neighbor == to || grid.cell(neighbor) == Some(CellCode::Empty);
            if open && grid.contains(neighbor) && !distances.contains_key(&neighbor) {
                let _ = distances.insert(neighbor, distance + 1);
                queue.push_back(neighbor);
            }
        }
    }

    None
}

#[test]
fn straight_corridor_beside_wall_steps_down_the_column() {
    let grid = walled_column_grid();
    let chaser = GridVec::new(1, 1);
    let player = GridVec::new(1, 8);
    let finder = PathFinder::default();

    assert_eq!(finder.next_step(&grid, chaser, player), Some(GridVec::new(1, 2)));
    let path = finder.find_path(&grid, chaser, player).expect("reachable");
    assert_eq!(path.len(), 7);
}

#[test]
fn next_step_on_target_yields_zero_displacement() {
    let grid = walled_column_grid();
    let cell = GridVec::new(3, 3);

    for strategy in [SearchStrategy::AStar, SearchStrategy::BreadthFirst] {
        assert_eq!(PathFinder::new(strategy).next_step(&grid, cell, cell), Some(cell));
    }
}

#[test]
fn sealed_wall_makes_target_unreachable() {
    let grid = walled_column_grid();
    let left = GridVec::new(2, 4);
    let right = GridVec::new(7, 4);

    for strategy in [SearchStrategy::AStar, SearchStrategy::BreadthFirst] {
        assert_eq!(PathFinder::new(strategy).next_step(&grid, left, right), None);
    }
}

#[test]
fn detours_around_partial_wall() {
    let mut grid = walled_column_grid();
    grid.set(GridVec::new(5, 8), CellCode::Empty)
        .expect("interior cell");

    let path = PathFinder::default()
        .find_path(&grid, GridVec::new(4, 1), GridVec::new(6, 1))
        .expect("gap at the bottom of the wall");

    assert_eq!(path.len(), 16);
    assert!(path
        .cells()
        .windows(2)
        .all(|pair| pair[0].is_adjacent(pair[1])));
    assert!(path
        .cells()
        .iter()
        .all(|cell| grid.cell(*cell) == Some(CellCode::Empty)));
}

#[test]
fn a_star_matches_breadth_first_lengths_on_random_grids() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed_0001);
    let a_star = PathFinder::new(SearchStrategy::AStar);
    let breadth_first = PathFinder::new(SearchStrategy::BreadthFirst);

    for _ in 0..40 {
        let size = rng.gen_range(6..=24);
        let grid = random_grid(&mut rng, size, 0.3);
        let interior: Vec<GridVec> = grid
            .interior_cells()
            .filter(|cell| grid.cell(*cell) == Some(CellCode::Empty))
            .collect();
        if interior.len() < 2 {
            continue;
        }

        for _ in 0..10 {
            let from = interior[rng.gen_range(0..interior.len())];
            let to = interior[rng.gen_range(0..interior.len())];
            let expected = reference_distance(&grid, from, to);

            let found = a_star.find_path(&grid, from, to).map(|path| path.len());
            let fallback = breadth_first.find_path(&grid, from, to).map(|path| path.len());

            assert_eq!(found, expected, "A* disagreed with BFS from {from:?} to {to:?}");
            assert_eq!(fallback, expected, "BFS strategy disagreed from {from:?} to {to:?}");

            if let (Some(step), true) = (a_star.next_step(&grid, from, to), from != to) {
                assert!(step.is_adjacent(from), "first step must neighbour the start");
            }
        }
    }
}

#[test]
fn large_open_grid_is_crossed_corner_to_corner() {
    let grid = Grid::bordered(400);
    let from = GridVec::new(1, 1);
    let to = GridVec::new(398, 398);

    for strategy in [SearchStrategy::AStar, SearchStrategy::BreadthFirst] {
        let path = PathFinder::new(strategy)
            .find_path(&grid, from, to)
            .expect("open grid is connected");
        assert_eq!(path.len(), 794, "{strategy:?}");
        assert_eq!(path.cells().first(), Some(&from));
        assert_eq!(path.cells().last(), Some(&to));
    }
}
