//! 错误类型定义

use thiserror::Error;

/// 对局规则错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// 房间已满
    #[error("Room is full")]
    RoomFull,

    /// 玩家不在房间中
    #[error("Player is not in this room")]
    NotInRoom,

    /// 当前阶段不允许该操作
    #[error("Operation not allowed in current phase")]
    WrongPhase,

    /// 不是你的回合
    #[error("Not your turn")]
    NotYourTurn,

    /// 飞机数量不对
    #[error("Wrong plane count: {count} (expected {expected})")]
    WrongPlaneCount { count: usize, expected: usize },

    /// 布阵棋盘含有非法格子
    #[error("Board contains non-placement cells")]
    InvalidBoard,

    /// 该格子已被结算（或坐标越界）
    #[error("Shot at ({row}, {col}) has no effect")]
    ShotIgnored { row: u8, col: u8 },

    /// 攻击阶段对手棋盘缺失，房间不变量被破坏
    #[error("Opponent board is missing")]
    MissingBoard,

    /// 随机布阵在尝试上限内未能完成
    #[error("Board generation failed after {attempts} attempts")]
    GenerationFailed { attempts: usize },
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误（bincode）
    #[error("Bincode serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// 协议版本不匹配
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// 帧大小超限
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
