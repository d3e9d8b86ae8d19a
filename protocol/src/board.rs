//! 棋盘状态
//!
//! 每名玩家各持有一张 10x10 棋盘，布阵阶段写入飞机，
//! 攻击阶段由对手的射击改写格子状态。

use serde::{Deserialize, Serialize};

use crate::constants::BOARD_SIZE;
use crate::plane::Orientation;

/// 格子状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    /// 空格
    Empty,
    /// 机头
    Head,
    /// 机身
    Body,
    /// 机头被击中（该飞机被击落）
    HitHead,
    /// 机身被击中
    HitBody,
    /// 射空
    Miss,
}

impl Cell {
    /// 是否已被射击结算（结算过的格子不再改变）
    pub fn is_resolved(self) -> bool {
        matches!(self, Cell::HitHead | Cell::HitBody | Cell::Miss)
    }

    /// 是否为布阵阶段合法的格子状态
    pub fn is_placement(self) -> bool {
        matches!(self, Cell::Empty | Cell::Head | Cell::Body)
    }
}

/// 射击结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotOutcome {
    /// 射空
    Miss,
    /// 击中机身
    HitBody,
    /// 击中机头（飞机被击落）
    HitHead,
}

/// 10x10 棋盘，按 [行][列] 索引
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// 获取指定格子的状态，越界返回 None
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// 检查能否以 (head_row, head_col) 为机头、按指定朝向放置一架飞机
    ///
    /// 要求所有偏移格子均在棋盘内且为空，无副作用
    pub fn can_place(&self, head_row: usize, head_col: usize, orientation: Orientation) -> bool {
        for (dx, dy) in orientation.offsets() {
            let r = head_row as i32 + dy as i32;
            let c = head_col as i32 + dx as i32;
            if r < 0 || r >= BOARD_SIZE as i32 || c < 0 || c >= BOARD_SIZE as i32 {
                return false;
            }
            if self.cells[r as usize][c as usize] != Cell::Empty {
                return false;
            }
        }
        true
    }

    /// 放置一架飞机
    ///
    /// 调用方必须先用 [`can_place`](Self::can_place) 校验，
    /// 在非法位置上放置的结果未定义
    pub fn place(&mut self, head_row: usize, head_col: usize, orientation: Orientation) {
        let offsets = orientation.offsets();
        for (i, (dx, dy)) in offsets.iter().enumerate() {
            let r = (head_row as i32 + *dy as i32) as usize;
            let c = (head_col as i32 + *dx as i32) as usize;
            self.cells[r][c] = if i == 0 { Cell::Head } else { Cell::Body };
        }
    }

    /// 对指定格子结算一次射击
    ///
    /// 已结算过的格子（以及越界坐标）返回 None 且不做任何改动，
    /// 这是防止重复计数的关键保护
    pub fn apply_shot(&mut self, row: usize, col: usize) -> Option<ShotOutcome> {
        let cell = self.get(row, col)?;
        let (new_cell, outcome) = match cell {
            Cell::Empty => (Cell::Miss, ShotOutcome::Miss),
            Cell::Head => (Cell::HitHead, ShotOutcome::HitHead),
            Cell::Body => (Cell::HitBody, ShotOutcome::HitBody),
            Cell::HitHead | Cell::HitBody | Cell::Miss => return None,
        };
        self.cells[row][col] = new_cell;
        Some(outcome)
    }

    /// 剩余未被击中的机头数
    ///
    /// 机头被击中即视为整架飞机被击落，机身是否命中不影响判定，
    /// 胜负条件为机头数归零
    pub fn heads_remaining(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&c| c == Cell::Head)
            .count()
    }

    /// 检查是否为合法的布阵棋盘（只含空格/机头/机身）
    pub fn is_placement_only(&self) -> bool {
        self.cells.iter().flatten().all(|c| c.is_placement())
    }

    /// 统计被占用（机头或机身）的格子数
    pub fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&c| c == Cell::Head || c == Cell::Body)
            .count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}
