//! Grid A* with 8-directional movement (`spec.md` §4.6 "Pathfinding").
//! Bounded by a max-expanded-node budget; exceeding it without reaching
//! the goal returns `None` (the caller reports `PATH_BLOCKED`).

use crate::world::terrain::TerrainGrid;
use glam::IVec2;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

const DIAGONAL_COST: f32 = std::f32::consts::SQRT_2;

#[derive(Clone, Copy, PartialEq)]
struct ScoredNode {
    cost: f32,
    node: IVec2,
}

impl Eq for ScoredNode {}

impl Ord for ScoredNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap via BinaryHeap (a max-heap) by reversing the comparison.
        other.cost.total_cmp(&self.cost)
    }
}

impl PartialOrd for ScoredNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn octile_heuristic(a: IVec2, b: IVec2) -> f32 {
    let dx = (a.x - b.x).unsigned_abs() as f32;
    let dy = (a.y - b.y).unsigned_abs() as f32;
    let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
    lo * DIAGONAL_COST + (hi - lo)
}

fn neighbors(grid: &TerrainGrid, p: IVec2) -> impl Iterator<Item = (IVec2, f32)> + '_ {
    const OFFSETS: [(i32, i32, f32); 8] = [
        (1, 0, 1.0),
        (-1, 0, 1.0),
        (0, 1, 1.0),
        (0, -1, 1.0),
        (1, 1, DIAGONAL_COST),
        (1, -1, DIAGONAL_COST),
        (-1, 1, DIAGONAL_COST),
        (-1, -1, DIAGONAL_COST),
    ];
    OFFSETS.iter().filter_map(move |&(dx, dy, cost)| {
        let candidate = IVec2::new(p.x + dx, p.y + dy);
        grid.get(candidate.x, candidate.y).filter(|t| t.is_walkable).map(|_| (candidate, cost))
    })
}

/// Returns the walkable tile path from `from` to `to` inclusive, or
/// `None` if no path was found within `max_expanded` node expansions.
pub fn find_path(grid: &TerrainGrid, from: IVec2, to: IVec2, max_expanded: usize) -> Option<Vec<IVec2>> {
    if from == to {
        return Some(vec![from]);
    }
    if grid.get(to.x, to.y).map(|t| !t.is_walkable).unwrap_or(true) {
        return None;
    }

    let mut open = BinaryHeap::new();
    let mut g_score: HashMap<IVec2, f32> = HashMap::new();
    let mut came_from: HashMap<IVec2, IVec2> = HashMap::new();

    g_score.insert(from, 0.0);
    open.push(ScoredNode { cost: octile_heuristic(from, to), node: from });

    let mut expanded = 0usize;
    while let Some(ScoredNode { node: current, .. }) = open.pop() {
        if current == to {
            return Some(reconstruct(&came_from, current));
        }
        expanded += 1;
        if expanded > max_expanded {
            return None;
        }

        let current_g = *g_score.get(&current).unwrap_or(&f32::INFINITY);
        for (next, step_cost) in neighbors(grid, current) {
            let tentative_g = current_g + step_cost;
            if tentative_g < *g_score.get(&next).unwrap_or(&f32::INFINITY) {
                came_from.insert(next, current);
                g_score.insert(next, tentative_g);
                let f = tentative_g + octile_heuristic(next, to);
                open.push(ScoredNode { cost: f, node: next });
            }
        }
    }
    None
}

fn reconstruct(came_from: &HashMap<IVec2, IVec2>, mut current: IVec2) -> Vec<IVec2> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::terrain::TileType;

    #[test]
    fn finds_straight_line_on_open_grid() {
        let grid = TerrainGrid::new_flat(16, 16, TileType::Grass);
        let path = find_path(&grid, IVec2::new(0, 0), IVec2::new(5, 0), 1000).unwrap();
        assert_eq!(*path.first().unwrap(), IVec2::new(0, 0));
        assert_eq!(*path.last().unwrap(), IVec2::new(5, 0));
    }

    #[test]
    fn unreachable_goal_returns_none() {
        let grid = TerrainGrid::new_flat(16, 16, TileType::Mountain);
        let path = find_path(&grid, IVec2::new(0, 0), IVec2::new(5, 0), 1000);
        assert!(path.is_none());
    }

    #[test]
    fn budget_exceeded_returns_none() {
        let grid = TerrainGrid::new_flat(64, 64, TileType::Grass);
        let path = find_path(&grid, IVec2::new(0, 0), IVec2::new(63, 63), 2);
        assert!(path.is_none());
    }
}
