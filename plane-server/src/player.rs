//! 参战方管理

use protocol::{Board, PlayerId};

/// 一场对局中的一方
///
/// 随房间创建/加入而产生，随房间销毁而消失
#[derive(Debug)]
pub struct Participant {
    pub id: PlayerId,
    /// 0 = 房主，1 = 加入者
    pub index: u8,
    /// 是否已完成布阵
    pub ready: bool,
    /// 布阵棋盘，提交或自动生成前为 None
    pub board: Option<Board>,
}

impl Participant {
    pub fn new(id: PlayerId, index: u8) -> Self {
        Self {
            id,
            index,
            ready: false,
            board: None,
        }
    }

    /// 记录布阵结果并标记就绪
    pub fn set_board(&mut self, board: Board) {
        self.board = Some(board);
        self.ready = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_participant() {
        let p = Participant::new(100, 0);
        assert_eq!(p.index, 0);
        assert!(!p.ready);
        assert!(p.board.is_none());
    }

    #[test]
    fn test_set_board() {
        let mut p = Participant::new(100, 1);
        p.set_board(Board::empty());
        assert!(p.ready);
        assert!(p.board.is_some());
    }
}
