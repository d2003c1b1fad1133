use rand::Rng;
use std::fmt;
use std::sync::OnceLock;

use crate::game::{Game, MoveResult, Spawn, CANONICAL_SPAWNS};

/// A direction to slide/merge tiles.
///
/// The declaration order is the order [`Game::legal_actions`] reports moves in,
/// and the static preference order of the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Move {
    Up,
    Left,
    Right,
    Down,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Left, Move::Right, Move::Down];
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(name)
    }
}

const LINE_TABLE_SIZE: usize = 0x1_0000; // every packed 4-tile line
const MAX_EXPONENT: u8 = 15;

type BoardRaw = u64;
type Line = u16;

struct LineTables {
    left: Box<[Line]>,
    right: Box<[Line]>,
    left_points: Box<[u32]>,
    right_points: Box<[u32]>,
}

static TABLES: OnceLock<LineTables> = OnceLock::new();

#[inline(always)]
fn tables() -> &'static LineTables { TABLES.get_or_init(build_tables) }

/// Build the line tables now instead of on the first move. Safe to call repeatedly.
pub fn warm() { let _ = tables(); }

fn build_tables() -> LineTables {
    let mut left = vec![0; LINE_TABLE_SIZE];
    let mut right = vec![0; LINE_TABLE_SIZE];
    let mut left_points = vec![0; LINE_TABLE_SIZE];
    let mut right_points = vec![0; LINE_TABLE_SIZE];
    for idx in 0..LINE_TABLE_SIZE {
        let tiles = unpack_line(idx as Line);
        let (slid, points) = slide_toward_start(tiles);
        left[idx] = pack_line(slid);
        left_points[idx] = points;

        let mut reversed = tiles;
        reversed.reverse();
        let (mut slid, points) = slide_toward_start(reversed);
        slid.reverse();
        right[idx] = pack_line(slid);
        right_points[idx] = points;
    }
    LineTables {
        left: left.into_boxed_slice(),
        right: right.into_boxed_slice(),
        left_points: left_points.into_boxed_slice(),
        right_points: right_points.into_boxed_slice(),
    }
}

/// Slide exponents toward index 0, merging each equal pair at most once.
/// Returns the new line and the value of every merged tile summed.
fn slide_toward_start(line: [u8; 4]) -> ([u8; 4], u32) {
    let mut out = [0u8; 4];
    let mut len = 0;
    let mut points = 0;
    let mut pending: Option<u8> = None;
    for &exp in line.iter().filter(|&&e| e != 0) {
        match pending {
            Some(p) if p == exp && p < MAX_EXPONENT => {
                out[len] = p + 1;
                len += 1;
                points += 1u32 << (p + 1);
                pending = None;
            }
            Some(p) => {
                out[len] = p;
                len += 1;
                pending = Some(exp);
            }
            None => pending = Some(exp),
        }
    }
    if let Some(p) = pending {
        out[len] = p;
    }
    (out, points)
}

fn unpack_line(line: Line) -> [u8; 4] {
    [(line >> 12) as u8 & 0xf, (line >> 8) as u8 & 0xf, (line >> 4) as u8 & 0xf, line as u8 & 0xf]
}

fn pack_line(tiles: [u8; 4]) -> Line {
    (tiles[0] as Line) << 12 | (tiles[1] as Line) << 8 | (tiles[2] as Line) << 4 | tiles[3] as Line
}

// Credit to Nneonneo
fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

#[inline]
fn row_of(raw: BoardRaw, row: usize) -> Line { (raw >> (48 - 16 * row)) as Line }

#[inline]
fn nibble_shift(row: usize, col: usize) -> u32 { (60 - 4 * (row * 4 + col)) as u32 }

fn slide_rows(raw: BoardRaw, lines: &[Line], points: &[u32]) -> (BoardRaw, u64) {
    (0..4).fold((0, 0), |(out, gained), row| {
        let line = row_of(raw, row) as usize;
        (out | (lines[line] as BoardRaw) << (48 - 16 * row), gained + points[line] as u64)
    })
}

/// Packed 4x4 board: 16 exponent nibbles in a `u64` (row-major, top-left in the
/// high nibble) plus the running score.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board {
    raw: BoardRaw,
    score: u64,
}

impl Board {
    pub const EMPTY: Board = Board { raw: 0, score: 0 };

    /// Board from packed nibbles with a zero score.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self { Board { raw, score: 0 } }

    /// Board from a grid of exponents (0 = empty). Exponents above 15 saturate.
    ///
    /// ```
    /// use anytime_2048::engine::Board;
    /// use anytime_2048::game::Game;
    /// let b = Board::from_rows([[1, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 3]]);
    /// assert_eq!(b.tile_at(3, 3), 3);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn from_rows(rows: [[u8; 4]; 4]) -> Self {
        let mut raw = 0;
        for (r, line) in rows.iter().enumerate() {
            for (c, &exp) in line.iter().enumerate() {
                raw |= (exp.min(MAX_EXPONENT) as BoardRaw) << nibble_shift(r, c);
            }
        }
        Board::from_raw(raw)
    }

    #[inline]
    pub fn with_score(self, score: u64) -> Self { Board { score, ..self } }

    #[inline]
    pub fn raw(&self) -> BoardRaw { self.raw }

    #[inline]
    pub fn score(&self) -> u64 { self.score }

    /// Slide/merge in `dir` without spawning. Points are added to the running score.
    pub fn shift(self, dir: Move) -> MoveResult<Board> {
        let t = tables();
        let (raw, points) = match dir {
            Move::Left => slide_rows(self.raw, &t.left, &t.left_points),
            Move::Right => slide_rows(self.raw, &t.right, &t.right_points),
            Move::Up => {
                let (raw, points) = slide_rows(transpose(self.raw), &t.left, &t.left_points);
                (transpose(raw), points)
            }
            Move::Down => {
                let (raw, points) = slide_rows(transpose(self.raw), &t.right, &t.right_points);
                (transpose(raw), points)
            }
        };
        MoveResult { board: Board { raw, score: self.score + points }, points }
    }

    /// True when sliding in `dir` changes the tiles.
    #[inline]
    pub fn can_move(self, dir: Move) -> bool { self.shift(dir).board.raw != self.raw }

    /// Place a random 2 (90%) or 4 (10%) in a random empty cell using `rng`.
    /// A full board is returned unchanged.
    ///
    /// ```
    /// use anytime_2048::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty = self.count_empty();
        if empty == 0 {
            return self;
        }
        let mut target = rng.gen_range(0..empty);
        let exponent = if rng.gen::<f64>() < CANONICAL_SPAWNS[0].probability {
            CANONICAL_SPAWNS[0].exponent
        } else {
            CANONICAL_SPAWNS[1].exponent
        };
        for idx in 0..16 {
            let shift = nibble_shift(idx / 4, idx % 4);
            if (self.raw >> shift) & 0xf == 0 {
                if target == 0 {
                    return Board { raw: self.raw | (exponent as BoardRaw) << shift, ..self };
                }
                target -= 1;
            }
        }
        self
    }

    /// Apply `dir` and, if the board changed, spawn a random tile.
    pub fn play<R: Rng + ?Sized>(self, dir: Move, rng: &mut R) -> Self {
        let moved = self.shift(dir).board;
        if moved.raw != self.raw { moved.with_random_tile(rng) } else { self }
    }

    pub fn count_empty(self) -> usize {
        let mut x = self.raw;
        x |= x >> 1;
        x |= x >> 2;
        x &= 0x1111111111111111;
        16 - x.count_ones() as usize
    }

    /// Highest tile value (2, 4, 8, ...), 0 on an empty board.
    pub fn highest_tile(self) -> u64 {
        let max = (0..16).map(|i| (self.raw >> (60 - 4 * i)) & 0xf).max().unwrap_or(0);
        if max == 0 { 0 } else { 1 << max }
    }
}

impl Game for Board {
    type Action = Move;

    const ROWS: usize = 4;
    const COLS: usize = 4;

    fn legal_actions(&self) -> Vec<Move> {
        Move::ALL.into_iter().filter(|&dir| self.can_move(dir)).collect()
    }

    fn apply(&self, action: Move) -> MoveResult<Board> { self.shift(action) }

    fn is_terminal(&self) -> bool { !Move::ALL.iter().any(|&dir| self.can_move(dir)) }

    fn score(&self) -> u64 { self.score }

    #[inline]
    fn tile_at(&self, row: usize, col: usize) -> u8 { ((self.raw >> nibble_shift(row, col)) & 0xf) as u8 }

    fn empty_cells(&self) -> usize { self.count_empty() }

    fn spawns(&self) -> Vec<Spawn<Board>> {
        let mut out = Vec::with_capacity(self.count_empty() * CANONICAL_SPAWNS.len());
        for row in 0..4 {
            for col in 0..4 {
                if self.tile_at(row, col) != 0 {
                    continue;
                }
                let shift = nibble_shift(row, col);
                for outcome in CANONICAL_SPAWNS {
                    out.push(Spawn {
                        cell: (row, col),
                        exponent: outcome.exponent,
                        probability: outcome.probability,
                        board: Board { raw: self.raw | (outcome.exponent as BoardRaw) << shift, ..*self },
                    });
                }
            }
        }
        out
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x}, score={})", self.raw, self.score)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "score: {}", self.score)?;
        for row in 0..4 {
            if row > 0 {
                writeln!(f, "{}", "-".repeat(31))?;
            }
            let cells: Vec<String> = (0..4)
                .map(|col| match self.tile_at(row, col) {
                    0 => " ".repeat(7),
                    exp => format!("{:^7}", 1u32 << exp),
                })
                .collect();
            writeln!(f, "{}", cells.join("|"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn it_slides_lines_toward_start() {
        assert_eq!(slide_toward_start([0, 0, 0, 0]), ([0, 0, 0, 0], 0));
        assert_eq!(slide_toward_start([1, 2, 1, 2]), ([1, 2, 1, 2], 0));
        assert_eq!(slide_toward_start([1, 1, 2, 2]), ([2, 3, 0, 0], 4 + 8));
        assert_eq!(slide_toward_start([1, 0, 0, 1]), ([2, 0, 0, 0], 4));
        assert_eq!(slide_toward_start([2, 2, 2, 0]), ([3, 2, 0, 0], 8));
        assert_eq!(slide_toward_start([15, 15, 0, 0]), ([15, 15, 0, 0], 0));
    }

    #[test]
    fn test_shift_left_and_right() {
        let game = Board::from_raw(0x1234133220021002);
        let left = game.shift(Move::Left);
        assert_eq!(left.board.raw(), 0x1234142030001200);
        assert_eq!(left.points, 24);
        let right = game.shift(Move::Right);
        assert_eq!(right.board.raw(), 0x1234014200030012);
        assert_eq!(right.points, 24);
    }

    #[test]
    fn test_shift_up_and_down() {
        let game = Board::from_raw(0x1121230033004222);
        let up = game.shift(Move::Up);
        assert_eq!(up.board.raw(), 0x1131240232004000);
        assert_eq!(up.points, 24);
        let down = game.shift(Move::Down);
        assert_eq!(down.board.raw(), 0x1000210034014232);
        assert_eq!(down.points, 24);
    }

    #[test]
    fn shift_accumulates_running_score() {
        let game = Board::from_raw(0x1100000000000000).with_score(40);
        let moved = game.shift(Move::Left);
        assert_eq!(moved.points, 4);
        assert_eq!(moved.board.score(), 44);
    }

    #[test]
    fn legal_actions_skip_no_op_moves() {
        let game = Board::from_rows([[1, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert_eq!(game.legal_actions(), vec![Move::Right, Move::Down]);
        assert!(!game.is_terminal());
    }

    #[test]
    fn checkerboard_is_terminal() {
        let game = Board::from_raw(0x1212212112122121);
        assert!(game.legal_actions().is_empty());
        assert!(game.is_terminal());
        assert!(Board::EMPTY.is_terminal());
    }

    #[test]
    fn it_count_empty() {
        assert_eq!(Board::from_raw(0x1111000011110000).count_empty(), 8);
        assert_eq!(Board::from_raw(0x1100000000000000).count_empty(), 14);
        assert_eq!(Board::EMPTY.count_empty(), 16);
    }

    #[test]
    fn tile_at_reads_row_major() {
        let game = Board::from_raw(0x0123456789abcdef);
        assert_eq!(game.tile_at(0, 3), 3);
        assert_eq!(game.tile_at(2, 2), 10);
        assert_eq!(game.tile_at(3, 3), 15);
        assert_eq!(game.highest_tile(), 32768);
    }

    #[test]
    fn spawns_cover_each_empty_cell_twice() {
        let game = Board::from_raw(0x1212212112122120);
        let spawns = game.spawns();
        assert_eq!(spawns.len(), 2);
        assert_eq!(spawns[0].cell, (3, 3));
        assert_eq!(spawns[0].board.tile_at(3, 3), 1);
        assert_eq!(spawns[1].board.tile_at(3, 3), 2);
        assert!((spawns[0].probability - 0.9).abs() < 1e-12);
        assert!((spawns[1].probability - 0.1).abs() < 1e-12);
    }

    #[test]
    fn random_tiles_fill_the_board() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut game = Board::EMPTY;
        for _ in 0..16 {
            game = game.with_random_tile(&mut rng);
        }
        assert_eq!(game.count_empty(), 0);
        assert_eq!(game.with_random_tile(&mut rng), game);
        assert!((0..16).all(|i| matches!(game.tile_at(i / 4, i % 4), 1 | 2)));
    }

    #[test]
    fn play_ignores_no_op_moves() {
        let mut rng = StdRng::seed_from_u64(1);
        let game = Board::from_rows([[1, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert_eq!(game.play(Move::Left, &mut rng), game);
        assert_eq!(game.play(Move::Right, &mut rng).count_empty(), 14);
    }
}
