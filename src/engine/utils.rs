use crate::grid::Grid;
use crate::rng::Rng;
use crate::types::{CellPos, Personality};

pub(super) fn ghost_id(index: usize) -> String {
    format!("ghost_{}", index + 1)
}

pub(super) fn personality_for(index: usize) -> Personality {
    Personality::ROSTER[index % Personality::ROSTER.len()]
}

/// Open den cells in random order. Falls back to the player start when the
/// grid has no den.
pub(super) fn shuffled_den_cells(grid: &Grid, rng: &mut Rng) -> Vec<CellPos> {
    let mut cells: Vec<CellPos> = match grid.den() {
        Some(den) => (den.top..=den.bottom)
            .flat_map(|row| (den.left..=den.right).map(move |col| CellPos::new(col, row)))
            .filter(|cell| grid.is_den(cell.col, cell.row))
            .collect(),
        None => Vec::new(),
    };
    if cells.is_empty() {
        return vec![grid.player_start()];
    }
    rng.shuffle(&mut cells);
    cells
}
