//! World save format
//!
//! A world is saved as `width,height|id0,id1,...,idN`: the grid size, then
//! every cell's material id in row-major order (0 = empty). Loading validates
//! the whole document before touching the grid, so a rejected load leaves the
//! existing world intact.

use thiserror::Error;

use super::Grid;
use crate::simulation::Materials;

/// Errors raised when loading a saved world
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("malformed world data: {0}")]
    Malformed(String),
    #[error("world is {found_width}x{found_height}, grid is {expected_width}x{expected_height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        found_width: u32,
        found_height: u32,
    },
    #[error("expected {expected} cells, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("cell {index} has invalid material id {value:?}")]
    BadMaterialId { index: usize, value: String },
    #[error("cell {index} references unknown material {id}")]
    UnknownMaterial { index: usize, id: u16 },
}

/// A parsed, validated-for-syntax save
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldSnapshot {
    pub width: u32,
    pub height: u32,
    /// Material ids, row-major
    pub cells: Vec<u16>,
}

/// Write the grid's material ids
pub fn serialize(grid: &Grid) -> String {
    let ids: Vec<String> = grid.material_ids().map(|id| id.to_string()).collect();
    format!("{},{}|{}", grid.width(), grid.height(), ids.join(","))
}

/// Parse a save without checking it against any grid or registry
pub fn parse(text: &str) -> Result<WorldSnapshot, LoadError> {
    let text = text.trim();
    let (header, body) = text
        .split_once('|')
        .ok_or_else(|| LoadError::Malformed("missing '|' separator".to_string()))?;

    let (w, h) = header
        .split_once(',')
        .ok_or_else(|| LoadError::Malformed(format!("bad header {:?}", header)))?;
    let width: u32 = w
        .trim()
        .parse()
        .map_err(|_| LoadError::Malformed(format!("bad width {:?}", w)))?;
    let height: u32 = h
        .trim()
        .parse()
        .map_err(|_| LoadError::Malformed(format!("bad height {:?}", h)))?;

    let body = body.trim();
    let cells = if body.is_empty() {
        Vec::new()
    } else {
        body.split(',')
            .enumerate()
            .map(|(index, value)| {
                value.trim().parse::<u16>().map_err(|_| LoadError::BadMaterialId {
                    index,
                    value: value.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(WorldSnapshot {
        width,
        height,
        cells,
    })
}

/// Load a save into an existing grid of the same size
///
/// Dimensions, cell count and every material id are checked first; the grid
/// is only written once the whole save is known to be good.
pub fn deserialize_into(grid: &mut Grid, materials: &Materials, text: &str) -> Result<(), LoadError> {
    let snapshot = parse(text)?;
    validate(grid, materials, &snapshot)?;

    let width = grid.width();
    for (index, &id) in snapshot.cells.iter().enumerate() {
        let x = index as i32 % width;
        let y = index as i32 / width;
        // Validated above
        if let Some(def) = materials.get(id) {
            grid.set(x, y, def);
        }
    }
    log::info!(
        "Loaded {}x{} world ({} non-empty cells)",
        snapshot.width,
        snapshot.height,
        grid.count_non_empty()
    );
    Ok(())
}

/// Load a save into a new grid sized from the save's header
pub fn deserialize(materials: &Materials, text: &str) -> Result<Grid, LoadError> {
    let snapshot = parse(text)?;
    let expected = Grid::cell_count(snapshot.width, snapshot.height).ok_or_else(|| {
        LoadError::Malformed(format!(
            "{}x{} world is too large",
            snapshot.width, snapshot.height
        ))
    })?;
    // Check the body before allocating anything sized by the header
    if snapshot.cells.len() != expected {
        return Err(LoadError::LengthMismatch {
            expected,
            found: snapshot.cells.len(),
        });
    }
    let mut grid = Grid::new(snapshot.width, snapshot.height);
    validate(&grid, materials, &snapshot)?;
    for (index, &id) in snapshot.cells.iter().enumerate() {
        let x = (index as u32 % snapshot.width.max(1)) as i32;
        let y = (index as u32 / snapshot.width.max(1)) as i32;
        if let Some(def) = materials.get(id) {
            grid.set(x, y, def);
        }
    }
    Ok(grid)
}

fn validate(grid: &Grid, materials: &Materials, snapshot: &WorldSnapshot) -> Result<(), LoadError> {
    let (expected_width, expected_height) = (grid.width() as u32, grid.height() as u32);
    if snapshot.width != expected_width || snapshot.height != expected_height {
        return Err(LoadError::DimensionMismatch {
            expected_width,
            expected_height,
            found_width: snapshot.width,
            found_height: snapshot.height,
        });
    }

    let expected = expected_width as usize * expected_height as usize;
    if snapshot.cells.len() != expected {
        return Err(LoadError::LengthMismatch {
            expected,
            found: snapshot.cells.len(),
        });
    }

    if let Some((index, &id)) = snapshot
        .cells
        .iter()
        .enumerate()
        .find(|(_, id)| !materials.contains(**id))
    {
        return Err(LoadError::UnknownMaterial { index, id });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::MaterialId;

    fn sample_grid(materials: &Materials) -> Grid {
        let mut grid = Grid::new(4, 3);
        grid.set_id(materials, 0, 0, MaterialId::SAND);
        grid.set_id(materials, 3, 0, MaterialId::WATER);
        grid.set_id(materials, 1, 2, MaterialId::STONE);
        grid
    }

    #[test]
    fn test_serialize_format() {
        let materials = Materials::new();
        let grid = sample_grid(&materials);

        assert_eq!(serialize(&grid), "4,3|2,0,0,3,0,0,0,0,0,1,0,0");
    }

    #[test]
    fn test_round_trip_into_fresh_grid() {
        let materials = Materials::new();
        let grid = sample_grid(&materials);
        let text = serialize(&grid);

        let mut fresh = Grid::new(4, 3);
        deserialize_into(&mut fresh, &materials, &text).expect("load");

        assert!(grid.material_ids().eq(fresh.material_ids()));
        assert_eq!(fresh.count_non_empty(), 3);
    }

    #[test]
    fn test_deserialize_sizes_grid_from_header() {
        let materials = Materials::new();
        let grid = deserialize(&materials, "2,2|0,2,2,0").expect("load");

        assert_eq!((grid.width(), grid.height()), (2, 2));
        assert_eq!(grid.material_at(1, 0), Some(MaterialId::SAND));
        assert_eq!(grid.material_at(0, 1), Some(MaterialId::SAND));
    }

    #[test]
    fn test_oversized_header_is_an_error() {
        let materials = Materials::new();

        assert!(matches!(
            deserialize(&materials, "70000,70000|0"),
            Err(LoadError::Malformed(_))
        ));
        assert!(matches!(
            deserialize(&materials, "4294967295,1|0"),
            Err(LoadError::Malformed(_))
        ));
        // Fits, but the body is far too short
        assert_eq!(
            deserialize(&materials, "30000,30000|0,0").map(|g| g.width()),
            Err(LoadError::LengthMismatch {
                expected: 900_000_000,
                found: 2
            })
        );

        let mut grid = Grid::new(2, 2);
        assert!(deserialize_into(&mut grid, &materials, "70000,70000|0").is_err());
        assert_eq!(grid.count_non_empty(), 0);
    }

    #[test]
    fn test_dimension_mismatch_leaves_grid_untouched() {
        let materials = Materials::new();
        let mut grid = sample_grid(&materials);
        let before = serialize(&grid);

        let err = deserialize_into(&mut grid, &materials, "3,3|0,0,0,0,0,0,0,0,0").unwrap_err();

        assert!(matches!(err, LoadError::DimensionMismatch { .. }));
        assert_eq!(serialize(&grid), before);
    }

    #[test]
    fn test_length_mismatch() {
        let materials = Materials::new();
        let mut grid = Grid::new(2, 2);

        assert_eq!(
            deserialize_into(&mut grid, &materials, "2,2|1,1,1"),
            Err(LoadError::LengthMismatch {
                expected: 4,
                found: 3
            })
        );
        assert_eq!(grid.count_non_empty(), 0);
    }

    #[test]
    fn test_unknown_material_rejected_before_writing() {
        let materials = Materials::new();
        let mut grid = Grid::new(2, 2);

        let err = deserialize_into(&mut grid, &materials, "2,2|1,1,1,9999").unwrap_err();

        assert_eq!(err, LoadError::UnknownMaterial { index: 3, id: 9999 });
        assert_eq!(grid.count_non_empty(), 0);
    }

    #[test]
    fn test_malformed_input() {
        let materials = Materials::new();
        let mut grid = Grid::new(2, 2);

        for text in ["", "2,2", "x,2|0,0,0,0", "2|0,0,0,0"] {
            assert!(
                matches!(
                    deserialize_into(&mut grid, &materials, text),
                    Err(LoadError::Malformed(_))
                ),
                "{:?}",
                text
            );
        }
        assert!(matches!(
            deserialize_into(&mut grid, &materials, "2,2|0,a,0,0"),
            Err(LoadError::BadMaterialId { index: 1, .. })
        ));
    }

    #[test]
    fn test_load_resets_cell_state() {
        let materials = Materials::new();
        let mut grid = Grid::new(1, 1);
        grid.set_id(&materials, 0, 0, MaterialId::FIRE);
        grid.tick_lifetime(0, 0);
        grid.mark_updated(0, 0);

        deserialize_into(&mut grid, &materials, "1,1|5").expect("load");

        let cell = grid.get(0, 0).unwrap();
        assert_eq!(cell.lifetime, materials.get(MaterialId::FIRE).unwrap().lifetime);
        assert!(!cell.is_updated());
    }
}
