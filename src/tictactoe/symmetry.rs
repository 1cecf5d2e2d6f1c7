//! D4 symmetry group operations for board canonicalization

use serde::{Deserialize, Serialize};

use super::board::{Action, BOARD_SIDE, BoardState, CELL_COUNT, Cell};
use crate::types::StateKey;

/// D4 symmetry transformation (dihedral group of the square)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct D4Transform {
    /// Rotation in degrees (0, 90, 180, 270)
    pub rotation: u16,
    /// Whether to apply reflection
    pub reflection: bool,
}

impl D4Transform {
    pub fn identity() -> Self {
        D4Transform {
            rotation: 0,
            reflection: false,
        }
    }

    /// Get all 8 D4 transforms
    pub fn all() -> [D4Transform; 8] {
        let mut transforms = [D4Transform::identity(); 8];
        for (i, rotation) in [0, 90, 180, 270].into_iter().enumerate() {
            transforms[2 * i] = D4Transform {
                rotation,
                reflection: false,
            };
            transforms[2 * i + 1] = D4Transform {
                rotation,
                reflection: true,
            };
        }
        transforms
    }

    /// Apply transform to an in-bounds action
    pub fn transform_action(&self, action: Action) -> Action {
        let last = BOARD_SIDE - 1;
        let (mut row, mut col) = (action.row, action.col);

        // Reflect across the vertical axis first, then rotate clockwise.
        if self.reflection {
            col = last - col;
        }

        for _ in 0..(self.rotation / 90) {
            let new_row = col;
            let new_col = last - row;
            row = new_row;
            col = new_col;
        }

        Action::new(row, col)
    }

    /// Get the inverse transform
    pub fn inverse(&self) -> D4Transform {
        if self.reflection {
            // Reflect-then-rotate compositions are involutions.
            *self
        } else {
            D4Transform {
                rotation: (360 - self.rotation) % 360,
                reflection: false,
            }
        }
    }

    /// Apply transform to an array of cells
    pub fn apply_to_cells(&self, cells: &[Cell; CELL_COUNT]) -> [Cell; CELL_COUNT] {
        let mut transformed = [Cell::Empty; CELL_COUNT];
        for (idx, &cell) in cells.iter().enumerate() {
            if let Some(action) = Action::from_index(idx) {
                transformed[self.transform_action(action).index()] = cell;
            }
        }
        transformed
    }
}

/// Cached result of a key lookup context: the board the key was taken from,
/// the transform that produced it, and the key itself.
///
/// Actions chosen in key coordinates must be mapped back with
/// [`map_canonical_to_original`](Self::map_canonical_to_original) before they
/// are applied to the original board.
#[derive(Debug, Clone)]
pub struct CanonicalContext {
    pub state: BoardState,
    pub transform: D4Transform,
    pub key: StateKey,
}

impl CanonicalContext {
    pub fn map_action_to_canonical(&self, original: Action) -> Action {
        self.transform.transform_action(original)
    }

    pub fn map_canonical_to_original(&self, canonical: Action) -> Action {
        self.transform.inverse().transform_action(canonical)
    }
}

impl BoardState {
    /// Apply a D4 transform to the board
    pub fn transform(&self, t: &D4Transform) -> Self {
        BoardState {
            cells: t.apply_to_cells(&self.cells),
            to_move: self.to_move,
            rule: self.rule,
        }
    }

    /// Context that keys the board as-is
    pub fn identity_context(&self) -> CanonicalContext {
        CanonicalContext {
            state: *self,
            transform: D4Transform::identity(),
            key: self.key(),
        }
    }

    /// Context for the canonical form: the transform yielding the smallest key.
    ///
    /// Ties between transforms that produce the same key keep the first one in
    /// [`D4Transform::all`] order, so the result is deterministic.
    pub fn canonical_context(&self) -> CanonicalContext {
        let mut best = self.identity_context();

        for transform in D4Transform::all() {
            let transformed = self.transform(&transform);
            let key = transformed.key();
            if key < best.key {
                best = CanonicalContext {
                    state: transformed,
                    transform,
                    key,
                };
            }
        }

        best
    }

    /// Get the canonical form under D4 symmetry
    pub fn canonical(&self) -> Self {
        self.canonical_context().state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_transforms_are_distinct() {
        let transforms = D4Transform::all();
        let cell = Action::new(0, 1);
        let images: std::collections::HashSet<Action> = transforms
            .iter()
            .map(|t| t.transform_action(cell))
            .collect();
        assert_eq!(images.len(), 8);
    }

    #[test]
    fn test_inverse_round_trips_every_cell() {
        for transform in D4Transform::all() {
            for idx in 0..CELL_COUNT {
                let action = Action::from_index(idx).unwrap();
                let there = transform.transform_action(action);
                assert!(there.in_bounds());
                assert_eq!(transform.inverse().transform_action(there), action);
            }
        }
    }

    #[test]
    fn test_center_is_fixed() {
        for transform in D4Transform::all() {
            assert_eq!(transform.transform_action(Action::center()), Action::center());
        }
    }

    #[test]
    fn test_rotated_boards_share_canonical_key() {
        let board = BoardState::new().apply(Action::new(0, 0)).unwrap();
        let rotated = BoardState::new().apply(Action::new(4, 4)).unwrap();
        let mirrored = BoardState::new().apply(Action::new(0, 4)).unwrap();

        let key = board.canonical_context().key;
        assert_eq!(rotated.canonical_context().key, key);
        assert_eq!(mirrored.canonical_context().key, key);
        assert_ne!(
            BoardState::new()
                .apply(Action::center())
                .unwrap()
                .canonical_context()
                .key,
            key
        );
    }

    #[test]
    fn test_context_maps_actions_back() {
        let board = BoardState::new()
            .apply(Action::new(0, 1))
            .unwrap()
            .apply(Action::new(3, 3))
            .unwrap();
        let ctx = board.canonical_context();

        for action in board.empty_actions() {
            let canonical = ctx.map_action_to_canonical(action);
            assert_eq!(ctx.state.get(canonical), Cell::Empty);
            assert_eq!(ctx.map_canonical_to_original(canonical), action);
        }
    }
}
