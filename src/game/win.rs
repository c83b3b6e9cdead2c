use super::{BoardState, CoordsFull, Side, ROW_SIZE};

/// A line of same-side tokens which won the game, ordered from one end to the other.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WinRow {
    pub side: Side,
    pub row: Vec<CoordsFull>,
}

/// An undirected line through the cube, as a pair of opposite unit steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Axis {
    pub forward: [i8; 3],
    pub backward: [i8; 3],
}

const fn axis(x: i8, y: i8, z: i8) -> Axis {
    Axis {
        forward: [x, y, z],
        backward: [-x, -y, -z],
    }
}

/// All 13 axes a row can go along.
pub const AXES: [Axis; 13] = [
    // Straight along x, y (vertical), z.
    axis(1, 0, 0),
    axis(0, 1, 0),
    axis(0, 0, 1),
    // Diagonals with constant z.
    axis(1, 1, 0),
    axis(1, -1, 0),
    // Diagonals with constant y.
    axis(1, 0, 1),
    axis(1, 0, -1),
    // Diagonals with constant x.
    axis(0, 1, 1),
    axis(0, 1, -1),
    // 3D diagonals.
    axis(1, 1, 1),
    axis(1, 1, -1),
    axis(1, -1, 1),
    axis(1, -1, -1),
];

/// Checks whether the token of `side` at `coords` is part of a row of at least ROW_SIZE along any
/// axis, and returns the whole contiguous row if so.
///
/// The seed cell itself is counted without looking at the board, so this can be asked about a
/// token which is only hypothetically there. The result depends on the arguments only.
pub fn check_win(board: &BoardState, coords: CoordsFull, side: Side) -> Option<WinRow> {
    for axis in AXES.iter() {
        let mut row: Vec<CoordsFull> = walk(board, coords, axis.backward, side).collect();
        row.reverse();
        row.push(coords);
        row.extend(walk(board, coords, axis.forward, side));

        if row.len() >= ROW_SIZE {
            return Some(WinRow { side, row });
        }
    }

    None
}

// Cells after `from` in direction `dir` which hold `side`, up to the first one that doesn't or the
// edge of the board.
fn walk(
    board: &BoardState,
    from: CoordsFull,
    dir: [i8; 3],
    side: Side,
) -> impl Iterator<Item = CoordsFull> + '_ {
    std::iter::successors(step(from, dir), move |c| step(*c, dir))
        .take_while(move |c| board.get(*c) == Some(side))
}

fn step(coords: CoordsFull, dir: [i8; 3]) -> Option<CoordsFull> {
    Some(CoordsFull {
        x: offset(coords.x, dir[0])?,
        y: offset(coords.y, dir[1])?,
        z: offset(coords.z, dir[2])?,
    })
}

fn offset(v: usize, d: i8) -> Option<usize> {
    v.checked_add_signed(d as isize).filter(|n| *n < ROW_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn board_with(side: Side, cells: &[(usize, usize, usize)]) -> BoardState {
        let mut board = BoardState::new();
        for &(x, y, z) in cells {
            board.set(side, CoordsFull::new(x, y, z));
        }
        board
    }

    fn as_set(row: &[CoordsFull]) -> HashSet<CoordsFull> {
        row.iter().copied().collect()
    }

    #[test]
    fn test_axes_are_distinct_and_unit() {
        let mut seen = HashSet::new();
        for a in AXES.iter() {
            assert_ne!(a.forward, [0, 0, 0]);
            assert!(a.forward.iter().all(|d| (-1..=1).contains(d)));
            assert_eq!(a.backward, [-a.forward[0], -a.forward[1], -a.forward[2]]);

            assert!(seen.insert(a.forward));
            assert!(seen.insert(a.backward));
        }

        // Every non-zero direction is covered exactly once.
        assert_eq!(seen.len(), 26);
    }

    #[test]
    fn test_empty_board_single_token() {
        let board = board_with(Side::A, &[(1, 0, 1)]);
        assert_eq!(check_win(&board, CoordsFull::new(1, 0, 1), Side::A), None);
    }

    #[test]
    fn test_three_is_not_enough() {
        let board = board_with(Side::A, &[(0, 0, 0), (1, 0, 0), (2, 0, 0)]);
        assert_eq!(check_win(&board, CoordsFull::new(2, 0, 0), Side::A), None);
    }

    #[test]
    fn test_vertical_row() {
        let cells = [(3, 0, 2), (3, 1, 2), (3, 2, 2), (3, 3, 2)];
        let board = board_with(Side::B, &cells);

        let win = check_win(&board, CoordsFull::new(3, 3, 2), Side::B).unwrap();
        assert_eq!(win.side, Side::B);
        assert_eq!(
            win.row,
            cells
                .iter()
                .map(|&(x, y, z)| CoordsFull::new(x, y, z))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_row_found_from_middle_seed() {
        let cells = [(0, 1, 0), (0, 1, 1), (0, 1, 2), (0, 1, 3)];
        let board = board_with(Side::A, &cells);

        for &(x, y, z) in &cells {
            let win = check_win(&board, CoordsFull::new(x, y, z), Side::A).unwrap();
            assert_eq!(win.row.len(), 4);
            assert_eq!(win.row[0], CoordsFull::new(0, 1, 0));
            assert_eq!(win.row[3], CoordsFull::new(0, 1, 3));
        }
    }

    #[test]
    fn test_space_diagonal_descending() {
        let cells = [(0, 3, 3), (1, 2, 2), (2, 1, 1), (3, 0, 0)];
        let board = board_with(Side::A, &cells);

        let win = check_win(&board, CoordsFull::new(2, 1, 1), Side::A).unwrap();
        assert_eq!(
            as_set(&win.row),
            cells
                .iter()
                .map(|&(x, y, z)| CoordsFull::new(x, y, z))
                .collect::<HashSet<_>>()
        );
    }

    #[test]
    fn test_other_side_breaks_row() {
        let mut board = board_with(Side::A, &[(0, 0, 0), (1, 1, 1), (3, 3, 3)]);
        board.set(Side::B, CoordsFull::new(2, 2, 2));

        assert_eq!(check_win(&board, CoordsFull::new(3, 3, 3), Side::A), None);
        assert_eq!(check_win(&board, CoordsFull::new(0, 0, 0), Side::A), None);
    }

    #[test]
    fn test_seed_counts_without_being_on_board() {
        // Three in a row along x + z = 3, the fourth cell is only hypothetical.
        let board = board_with(Side::B, &[(1, 0, 2), (2, 0, 1), (3, 0, 0)]);
        let seed = CoordsFull::new(0, 0, 3);
        assert_eq!(board.get(seed), None);

        let win = check_win(&board, seed, Side::B).unwrap();
        assert_eq!(win.row.len(), 4);
        assert!(win.row.contains(&seed));

        // The same cells don't make a row for the other side.
        assert_eq!(check_win(&board, seed, Side::A), None);
    }

    #[test]
    fn test_does_not_mutate_board() {
        let board = board_with(Side::A, &[(0, 0, 0), (0, 1, 0), (0, 2, 0), (0, 3, 0)]);
        let before = board;
        let _ = check_win(&board, CoordsFull::new(0, 3, 0), Side::A);
        assert_eq!(board, before);
    }

    #[test]
    fn test_all_76_rows_detected() {
        let mut rows = HashSet::new();

        for x in 0..ROW_SIZE {
            for y in 0..ROW_SIZE {
                for z in 0..ROW_SIZE {
                    let seed = CoordsFull::new(x, y, z);

                    for a in AXES.iter() {
                        // Full line through the seed along this axis.
                        let mut line: Vec<CoordsFull> =
                            std::iter::successors(step(seed, a.backward), |c| step(*c, a.backward))
                                .collect();
                        line.push(seed);
                        line.extend(std::iter::successors(step(seed, a.forward), |c| {
                            step(*c, a.forward)
                        }));

                        if line.len() < ROW_SIZE {
                            continue;
                        }

                        let mut board = BoardState::new();
                        for c in &line {
                            board.set(Side::A, *c);
                        }

                        let win = check_win(&board, seed, Side::A).unwrap();
                        let mut cells = win.row.clone();
                        cells.sort();
                        line.sort();
                        assert_eq!(cells, line);

                        rows.insert(cells);
                    }
                }
            }
        }

        assert_eq!(rows.len(), 76);
    }
}
