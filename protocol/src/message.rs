//! 消息类型定义

use serde::{Deserialize, Serialize};

use crate::board::{Board, ShotOutcome};

/// 玩家 ID（由服务端按连接分配）
pub type PlayerId = u64;

/// 客户端发送给服务端的消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientMessage {
    // === 房间操作 ===
    /// 创建房间
    CreateRoom,
    /// 加入房间
    JoinRoom { code: String },

    // === 对局操作 ===
    /// 提交布阵
    SubmitPlacement { code: String, board: Board },
    /// 射击
    Shoot { code: String, row: u8, col: u8 },

    // === 心跳 ===
    /// 心跳请求
    Ping,
}

/// 对局参战方概要
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    /// 0 = 房主，1 = 加入者
    pub index: u8,
}

/// 服务端发送给客户端的消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerMessage {
    // === 房间事件 ===
    /// 房间创建成功
    RoomCreated { code: String },
    /// 加入房间成功
    RoomJoined { code: String, player_index: u8 },
    /// 双方到齐，对局开始（进入布阵阶段）
    MatchStarted {
        code: String,
        participants: Vec<ParticipantInfo>,
    },
    /// 布阵倒计时开始
    PlacementTimerStarted { limit_ms: u64 },

    // === 对局事件 ===
    /// 对手已完成布阵
    OpponentReady,
    /// 进入攻击阶段
    AttackPhaseStarted,
    /// 轮到指定玩家射击
    TurnChanged { player_index: u8 },
    /// 射击结果
    ShotResult {
        shooter_index: u8,
        row: u8,
        col: u8,
        outcome: ShotOutcome,
    },
    /// 对局结束
    MatchOver { winner_index: u8 },
    /// 对手离开（判定弃权，区别于计分胜利）
    OpponentLeft,

    // === 心跳 ===
    /// 心跳响应
    Pong,

    // === 错误 ===
    /// 错误消息
    Error { code: ErrorCode, message: String },
}

/// 错误码定义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    // === 房间相关 (1xx) ===
    /// 房间不存在
    RoomNotFound = 100,
    /// 房间已满
    RoomFull = 101,

    // === 布阵相关 (2xx) ===
    /// 飞机数量不对
    WrongPieceCount = 200,
    /// 棋盘数据非法
    InvalidBoard = 201,

    // === 系统相关 (5xx) ===
    /// 内部错误
    InternalError = 500,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_serialize() {
        let msg = ClientMessage::JoinRoom {
            code: "AB12C".to_string(),
        };
        let bytes = bincode::serialize(&msg).unwrap();
        let decoded: ClientMessage = bincode::deserialize(&bytes).unwrap();

        match decoded {
            ClientMessage::JoinRoom { code } => assert_eq!(code, "AB12C"),
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_server_message_serialize() {
        let msg = ServerMessage::ShotResult {
            shooter_index: 0,
            row: 3,
            col: 7,
            outcome: ShotOutcome::HitHead,
        };
        let bytes = bincode::serialize(&msg).unwrap();
        let decoded: ServerMessage = bincode::deserialize(&bytes).unwrap();

        match decoded {
            ServerMessage::ShotResult {
                shooter_index,
                row,
                col,
                outcome,
            } => {
                assert_eq!(shooter_index, 0);
                assert_eq!(row, 3);
                assert_eq!(col, 7);
                assert_eq!(outcome, ShotOutcome::HitHead);
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_board_round_trip() {
        use crate::plane::Orientation;

        let mut board = Board::empty();
        board.place(2, 4, Orientation::Down);

        let msg = ClientMessage::SubmitPlacement {
            code: "XY9Z0".to_string(),
            board: board.clone(),
        };
        let bytes = bincode::serialize(&msg).unwrap();
        let decoded: ClientMessage = bincode::deserialize(&bytes).unwrap();

        match decoded {
            ClientMessage::SubmitPlacement { board: decoded_board, .. } => {
                assert_eq!(decoded_board, board);
            }
            _ => panic!("Wrong message type"),
        }
    }
}
