//! 飞机形状定义

use serde::{Deserialize, Serialize};

/// 每架飞机占用的格子数（1 机头 + 7 机身）
pub const PLANE_CELLS: usize = 8;

/// 基准朝向（机头向下）的相对偏移 (dx, dy)
///
/// 所有偏移以机头为原点，机头固定在首位
pub const BASE_PLANE_SHAPE: [(i8, i8); PLANE_CELLS] = [
    (0, 0), // 机头
    (-1, 1),
    (0, 1),
    (1, 1),
    (0, 2),
    (-1, 3),
    (0, 3),
    (1, 3),
];

/// 飞机朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// 机头向下（基准朝向）
    Down,
    /// 机头向左
    Left,
    /// 机头向上
    Up,
    /// 机头向右
    Right,
}

impl Orientation {
    /// 所有朝向
    pub const ALL: [Orientation; 4] = [
        Orientation::Down,
        Orientation::Left,
        Orientation::Up,
        Orientation::Right,
    ];

    /// 逆时针旋转 90° 后的朝向
    pub fn rotated(self) -> Orientation {
        match self {
            Orientation::Down => Orientation::Left,
            Orientation::Left => Orientation::Up,
            Orientation::Up => Orientation::Right,
            Orientation::Right => Orientation::Down,
        }
    }

    /// 获取该朝向下的飞机偏移
    ///
    /// 基准朝向直接返回 [`BASE_PLANE_SHAPE`]，其余朝向应用对应的旋转矩阵
    pub fn offsets(self) -> [(i8, i8); PLANE_CELLS] {
        match self {
            Orientation::Down => BASE_PLANE_SHAPE,
            Orientation::Left => BASE_PLANE_SHAPE.map(|(x, y)| (-y, x)),
            Orientation::Up => BASE_PLANE_SHAPE.map(|(x, y)| (-x, -y)),
            Orientation::Right => BASE_PLANE_SHAPE.map(|(x, y)| (y, -x)),
        }
    }
}
