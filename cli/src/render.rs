// SPDX-License-Identifier: MIT OR Apache-2.0

//! ASCII board rendering for the CLI.

use tacnet_core::board::Grid;
use tacnet_core::BOARD_SIZE;

/// Render the board as ASCII art with row and column indices
pub fn render_board(grid: &Grid) -> String {
    let mut output = String::new();

    output.push_str("     0   1   2\n");
    for (row, cells) in grid.iter().enumerate() {
        if row > 0 {
            output.push_str("   ----+---+----\n");
        }
        output.push_str(&format!("{row:2}  "));
        for (col, cell) in cells.iter().enumerate() {
            if col > 0 {
                output.push('|');
            }
            match cell {
                Some(player) => output.push_str(&format!(" {player} ")),
                None => output.push_str("   "),
            }
        }
        output.push('\n');
    }
    output
}
