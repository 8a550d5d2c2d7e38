//! Rectangular map of shared cell types.

use std::sync::Arc;

use ticket_defence_core::{CellCoord, CellType, CellTypeId, DataError, GridDimensions};

use crate::catalog::Catalog;

/// Single map position and the terrain it was loaded with.
#[derive(Clone, Debug)]
pub struct Cell {
    coord: CellCoord,
    kind: Arc<CellType>,
}

impl Cell {
    /// Position of the cell.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Terrain shared with every other cell of the same type.
    #[must_use]
    pub fn kind(&self) -> &CellType {
        &self.kind
    }

    /// Reports whether enemies may stand on the cell.
    #[must_use]
    pub fn is_walkable(&self) -> bool {
        self.kind.walkable
    }
}

/// Row-major grid built once at construction and immutable afterwards.
#[derive(Clone, Debug)]
pub struct Grid {
    dimensions: GridDimensions,
    cells: Vec<Cell>,
}

impl Grid {
    pub(crate) fn build(
        map: &[Vec<CellTypeId>],
        cell_types: &Catalog<CellTypeId, CellType>,
    ) -> Result<Self, DataError> {
        let columns = map.first().map_or(0, Vec::len);
        if map.is_empty() || columns == 0 {
            return Err(DataError::EmptyMap);
        }

        let mut cells = Vec::with_capacity(map.len() * columns);
        for (row, ids) in map.iter().enumerate() {
            if ids.len() != columns {
                return Err(DataError::NonRectangular {
                    row,
                    expected: columns,
                    found: ids.len(),
                });
            }
            for (column, id) in ids.iter().enumerate() {
                let kind = cell_types
                    .get(id)
                    .ok_or(DataError::UnknownCellType {
                        row,
                        column,
                        id: *id,
                    })?;
                let coord = CellCoord::new(
                    u32::try_from(row).map_err(|_| DataError::MapTooLarge)?,
                    u32::try_from(column).map_err(|_| DataError::MapTooLarge)?,
                );
                cells.push(Cell {
                    coord,
                    kind: Arc::clone(kind),
                });
            }
        }

        let dimensions = GridDimensions::new(
            u32::try_from(map.len()).map_err(|_| DataError::MapTooLarge)?,
            u32::try_from(columns).map_err(|_| DataError::MapTooLarge)?,
        );
        Ok(Self { dimensions, cells })
    }

    /// Map dimensions in cells.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Cell at `coord`, or `None` when out of bounds.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        if !self.dimensions.contains(coord) {
            return None;
        }
        let row = usize::try_from(coord.row()).ok()?;
        let column = usize::try_from(coord.column()).ok()?;
        let width = usize::try_from(self.dimensions.columns()).ok()?;
        self.cells.get(row * width + column)
    }

    /// Reports whether `coord` is in bounds and walkable.
    #[must_use]
    pub fn is_walkable(&self, coord: CellCoord) -> bool {
        self.cell(coord).map_or(false, Cell::is_walkable)
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Rows of cells from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        let width = usize::try_from(self.dimensions.columns()).unwrap_or(usize::MAX);
        self.cells.chunks(width.max(1))
    }
}
