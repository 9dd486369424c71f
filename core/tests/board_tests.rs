// SPDX-License-Identifier: MIT OR Apache-2.0

//! Board engine behavior tests: alternation, win detection, draw and
//! rejection of illegal moves.

use rand::seq::SliceRandom;
use tacnet_core::{Board, GameError, GameStatus, Player, BOARD_SIZE};

const WIN_LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// Pick `n` cells outside `line` that never complete a winning line
/// among themselves, so the filler player cannot win by accident.
fn pick_fillers(line: &[(usize, usize); 3], n: usize) -> Vec<(usize, usize)> {
    let mut fillers: Vec<(usize, usize)> = Vec::new();
    'cells: for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            let cell = (row, col);
            if line.contains(&cell) || fillers.contains(&cell) {
                continue;
            }
            let completes_line = WIN_LINES.iter().any(|candidate| {
                candidate
                    .iter()
                    .all(|c| *c == cell || fillers.contains(c))
            });
            if completes_line {
                continue;
            }
            fillers.push(cell);
            if fillers.len() == n {
                break 'cells;
            }
        }
    }
    assert_eq!(fillers.len(), n, "not enough safe filler cells");
    fillers
}

#[test]
fn mover_alternates_strictly_until_terminal() {
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let mut board = Board::new();
        let mut expected = Player::X;
        loop {
            if board.status().is_over() {
                break;
            }
            assert_eq!(board.to_move(), expected);
            let open: Vec<(usize, usize)> = (0..BOARD_SIZE)
                .flat_map(|r| (0..BOARD_SIZE).map(move |c| (r, c)))
                .filter(|&(r, c)| board.cell(r, c).is_none())
                .collect();
            let &(row, col) = open.choose(&mut rng).unwrap();
            board.apply_move(row, col).unwrap();
            if board.status() == GameStatus::InProgress {
                expected = expected.opponent();
            }
        }
    }
}

#[test]
fn every_line_wins_for_x() {
    for line in &WIN_LINES {
        let mut board = Board::new();
        let fillers = pick_fillers(line, 2);
        board.apply_move(line[0].0, line[0].1).unwrap();
        board.apply_move(fillers[0].0, fillers[0].1).unwrap();
        board.apply_move(line[1].0, line[1].1).unwrap();
        board.apply_move(fillers[1].0, fillers[1].1).unwrap();
        board.apply_move(line[2].0, line[2].1).unwrap();
        assert_eq!(
            board.status(),
            GameStatus::Won(Player::X),
            "line {line:?} did not win for X"
        );
    }
}

#[test]
fn every_line_wins_for_o() {
    for line in &WIN_LINES {
        let mut board = Board::new();
        let fillers = pick_fillers(line, 3);
        board.apply_move(fillers[0].0, fillers[0].1).unwrap();
        board.apply_move(line[0].0, line[0].1).unwrap();
        board.apply_move(fillers[1].0, fillers[1].1).unwrap();
        board.apply_move(line[1].0, line[1].1).unwrap();
        board.apply_move(fillers[2].0, fillers[2].1).unwrap();
        board.apply_move(line[2].0, line[2].1).unwrap();
        assert_eq!(
            board.status(),
            GameStatus::Won(Player::O),
            "line {line:?} did not win for O"
        );
    }
}

#[test]
fn full_board_without_line_is_a_draw() {
    let mut board = Board::new();
    // X O X
    // X O O
    // O X X
    let sequence = [
        (0, 0), // X
        (0, 1), // O
        (0, 2), // X
        (1, 1), // O
        (1, 0), // X
        (1, 2), // O
        (2, 1), // X
        (2, 0), // O
        (2, 2), // X
    ];
    for (i, &(row, col)) in sequence.iter().enumerate() {
        board.apply_move(row, col).unwrap();
        if i < sequence.len() - 1 {
            assert_eq!(board.status(), GameStatus::InProgress);
        }
    }
    assert_eq!(board.status(), GameStatus::Draw);
}

#[test]
fn occupied_cell_is_rejected_without_state_change() {
    let mut board = Board::new();
    board.apply_move(0, 0).unwrap();
    assert_eq!(
        board.apply_move(0, 0),
        Err(GameError::Occupied { row: 0, col: 0 })
    );
    assert_eq!(board.cell(0, 0), Some(Player::X));
    assert_eq!(board.to_move(), Player::O);
}

#[test]
fn moves_after_terminal_status_are_rejected() {
    let mut board = Board::new();
    // X wins on the main diagonal.
    board.apply_move(0, 0).unwrap();
    board.apply_move(0, 1).unwrap();
    board.apply_move(1, 1).unwrap();
    board.apply_move(0, 2).unwrap();
    board.apply_move(2, 2).unwrap();
    assert_eq!(board.status(), GameStatus::Won(Player::X));
    assert_eq!(board.apply_move(1, 0), Err(GameError::GameOver));
    assert_eq!(board.cell(1, 0), None);
}

#[test]
fn reset_clears_the_board() {
    let mut board = Board::new();
    board.apply_move(0, 0).unwrap();
    board.apply_move(1, 1).unwrap();
    board.reset();
    assert_eq!(board.to_move(), Player::X);
    assert_eq!(board.status(), GameStatus::InProgress);
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            assert_eq!(board.cell(row, col), None);
        }
    }
}

#[test]
fn snapshot_is_detached_from_the_engine() {
    let mut board = Board::new();
    board.apply_move(0, 0).unwrap();
    let mut snapshot = board.snapshot();
    snapshot[2][2] = Some(Player::O);
    assert_eq!(board.cell(2, 2), None);
    assert_eq!(snapshot[0][0], Some(Player::X));
}
