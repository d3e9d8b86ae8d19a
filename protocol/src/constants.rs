//! 协议常量定义

/// 协议版本号
pub const PROTOCOL_VERSION: u8 = 1;

/// 棋盘边长（10x10）
pub const BOARD_SIZE: usize = 10;

/// 每名玩家的飞机数量
pub const PLANES_PER_PLAYER: usize = 3;

/// 布阵时间限制（毫秒）
pub const PLACEMENT_TIME_LIMIT_MS: u64 = 30_000;

/// 房间码长度
pub const ROOM_CODE_LEN: usize = 5;

/// 消息帧最大大小
pub const MAX_FRAME_SIZE: usize = 65536;
