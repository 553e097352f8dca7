#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shortest-path search used to validate generated maps and to steer the chaser.
//!
//! Searches only need the [`CellLookup`] capability, so transient grids built
//! during generation and the live world grid are searched the same way.

use std::{
    cmp::Ordering,
    collections::{BinaryHeap, VecDeque},
};

use escape_block_core::{CellCode, CellLookup, GridVec};

/// Algorithm used to explore the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SearchStrategy {
    /// A* guided by the Euclidean distance to the target.
    #[default]
    AStar,
    /// Breadth-first search without a heuristic.
    BreadthFirst,
}

/// Cells visited by a successful search, from the start to the target inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    cells: Vec<GridVec>,
}

impl Path {
    /// Every cell on the path including both endpoints.
    #[must_use]
    pub fn cells(&self) -> &[GridVec] {
        &self.cells
    }

    /// Number of steps needed to walk the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    /// Reports whether the path starts on its target.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell to enter first; the start cell itself when the path has no steps.
    #[must_use]
    pub fn first_step(&self) -> Option<GridVec> {
        self.cells.get(1).or_else(|| self.cells.first()).copied()
    }
}

/// Shortest-path search over 4-connected grids.
#[derive(Clone, Copy, Debug, Default)]
pub struct PathFinder {
    strategy: SearchStrategy,
}

impl PathFinder {
    /// Creates a path finder using the provided strategy.
    #[must_use]
    pub const fn new(strategy: SearchStrategy) -> Self {
        Self { strategy }
    }

    /// Neighbour of `from` on a shortest path toward `to`.
    ///
    /// Returns `Some(from)` when both cells coincide and `None` when `to`
    /// cannot be reached.
    #[must_use]
    pub fn next_step<G>(&self, grid: &G, from: GridVec, to: GridVec) -> Option<GridVec>
    where
        G: CellLookup + ?Sized,
    {
        if from == to {
            return Some(from);
        }

        self.find_path(grid, from, to)
            .and_then(|path| path.first_step())
    }

    /// Full shortest path from `from` to `to`, if one exists.
    ///
    /// Empty cells and the chaser's own cell are traversable; `to` is always
    /// accepted as the final cell as long as it lies inside the grid.
    #[must_use]
    pub fn find_path<G>(&self, grid: &G, from: GridVec, to: GridVec) -> Option<Path>
    where
        G: CellLookup + ?Sized,
    {
        if !grid.contains(from) || !grid.contains(to) {
            return None;
        }

        match self.strategy {
            SearchStrategy::AStar => a_star(grid, from, to),
            SearchStrategy::BreadthFirst => breadth_first(grid, from, to),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct SearchNode {
    cell: GridVec,
    parent: Option<usize>,
    steps: u32,
}

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    priority: f64,
    insertion: u64,
    node: usize,
}

impl Ord for OpenEntry {
    /// Reversed so the max-heap pops the lowest priority, then the oldest entry.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.insertion.cmp(&self.insertion))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

fn a_star<G>(grid: &G, from: GridVec, to: GridVec) -> Option<Path>
where
    G: CellLookup + ?Sized,
{
    let mut arena = vec![SearchNode {
        cell: from,
        parent: None,
        steps: 0,
    }];
    let mut open = BinaryHeap::new();
    let mut best_steps = CellTable::new(grid.size(), u32::MAX);
    let mut visited = CellTable::new(grid.size(), false);
    let mut insertion = 0u64;

    open.push(OpenEntry {
        priority: from.distance(to),
        insertion,
        node: 0,
    });
    best_steps.set(from, 0);

    while let Some(entry) = open.pop() {
        let current = arena[entry.node];
        if !visited.mark(current.cell) {
            continue;
        }

        if current.cell == to {
            return Some(reconstruct(&arena, entry.node));
        }

        let steps = current.steps.saturating_add(1);
        for neighbor in current.cell.neighbors() {
            if visited.get(neighbor) != Some(false) || !is_traversable(grid, neighbor, to) {
                continue;
            }
            if best_steps.get(neighbor).is_some_and(|known| known <= steps) {
                continue;
            }

            best_steps.set(neighbor, steps);
            arena.push(SearchNode {
                cell: neighbor,
                parent: Some(entry.node),
                steps,
            });
            insertion += 1;
            open.push(OpenEntry {
                priority: f64::from(steps) + neighbor.distance(to),
                insertion,
                node: arena.len() - 1,
            });
        }
    }

    None
}

fn breadth_first<G>(grid: &G, from: GridVec, to: GridVec) -> Option<Path>
where
    G: CellLookup + ?Sized,
{
    let mut arena = vec![SearchNode {
        cell: from,
        parent: None,
        steps: 0,
    }];
    let mut queue = VecDeque::from([0usize]);
    let mut visited = CellTable::new(grid.size(), false);
    let _ = visited.mark(from);

    while let Some(node) = queue.pop_front() {
        let current = arena[node];
        if current.cell == to {
            return Some(reconstruct(&arena, node));
        }

        for neighbor in current.cell.neighbors() {
            if !is_traversable(grid, neighbor, to) || !visited.mark(neighbor) {
                continue;
            }

            arena.push(SearchNode {
                cell: neighbor,
                parent: Some(node),
                steps: current.steps.saturating_add(1),
            });
            queue.push_back(arena.len() - 1);
        }
    }

    None
}

/// Per-cell search scratch stored densely in row-major order.
#[derive(Debug)]
struct CellTable<T> {
    side: usize,
    values: Vec<T>,
}

impl<T: Copy> CellTable<T> {
    fn new(size: u32, fill: T) -> Self {
        let side = size as usize;
        Self {
            side,
            values: vec![fill; side * side],
        }
    }

    fn index(&self, cell: GridVec) -> Option<usize> {
        let x = usize::try_from(cell.x()).ok()?;
        let y = usize::try_from(cell.y()).ok()?;
        (x < self.side && y < self.side).then(|| y * self.side + x)
    }

    fn get(&self, cell: GridVec) -> Option<T> {
        self.index(cell).map(|index| self.values[index])
    }

    fn set(&mut self, cell: GridVec, value: T) {
        if let Some(index) = self.index(cell) {
            self.values[index] = value;
        }
    }
}

impl CellTable<bool> {
    /// Marks `cell` and reports whether it was unmarked before.
    fn mark(&mut self, cell: GridVec) -> bool {
        match self.index(cell) {
            Some(index) => !std::mem::replace(&mut self.values[index], true),
            None => false,
        }
    }
}

fn is_traversable<G>(grid: &G, cell: GridVec, target: GridVec) -> bool
where
    G: CellLookup + ?Sized,
{
    match grid.cell(cell) {
        Some(CellCode::Empty | CellCode::Chaser) => true,
        Some(CellCode::Wall) => cell == target,
        None => false,
    }
}

fn reconstruct(arena: &[SearchNode], target: usize) -> Path {
    let mut cells = Vec::new();
    let mut cursor = Some(target);
    while let Some(index) = cursor {
        let node = arena[index];
        cells.push(node.cell);
        cursor = node.parent;
    }
    cells.reverse();
    Path { cells }
}
