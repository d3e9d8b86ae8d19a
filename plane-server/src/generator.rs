//! 随机布阵生成
//!
//! 玩家在布阵截止前未提交时，由服务端代为生成一张合法棋盘。

use rand::Rng;

use protocol::{Board, GameError, Orientation, BOARD_SIZE, PLANES_PER_PLAYER};

/// 随机尝试次数上限
///
/// 10x10 棋盘放 3 架飞机在该密度下必然可完成，上限只是防御
/// 病态随机序列导致的死循环；真的用尽说明逻辑出错
const MAX_ATTEMPTS: usize = 1000;

/// 生成一张随机布阵棋盘（恰好 3 架飞机）
pub fn random_board() -> Result<Board, GameError> {
    let mut rng = rand::thread_rng();
    let mut board = Board::empty();
    let mut placed = 0;
    let mut attempts = 0;

    while placed < PLANES_PER_PLAYER && attempts < MAX_ATTEMPTS {
        let row = rng.gen_range(0..BOARD_SIZE);
        let col = rng.gen_range(0..BOARD_SIZE);
        let orientation = Orientation::ALL[rng.gen_range(0..Orientation::ALL.len())];

        if board.can_place(row, col, orientation) {
            board.place(row, col, orientation);
            placed += 1;
        }
        attempts += 1;
    }

    if placed < PLANES_PER_PLAYER {
        return Err(GameError::GenerationFailed { attempts });
    }
    Ok(board)
}
