//! 飞机大战共享协议库
//!
//! 包含:
//! - 棋盘、飞机形状等核心数据结构
//! - 布阵校验与射击结算
//! - 消息类型定义 (ClientMessage, ServerMessage)
//! - 帧编解码 (FrameReader, FrameWriter)

mod board;
mod constants;
mod error;
mod message;
mod plane;
mod transport;

pub use board::{Board, Cell, ShotOutcome};
pub use constants::*;
pub use error::{GameError, ProtocolError, Result};
pub use message::{ClientMessage, ErrorCode, ParticipantInfo, PlayerId, ServerMessage};
pub use plane::{Orientation, BASE_PLANE_SHAPE, PLANE_CELLS};
pub use transport::{FrameReader, FrameWriter};
