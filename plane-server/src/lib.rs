//! 飞机大战服务端
//!
//! 包含:
//! - 房间系统与阶段状态机
//! - 参战方管理
//! - 随机布阵生成
//! - 消息处理与广播
//! - 服务端配置

pub mod config;
pub mod generator;
pub mod player;
pub mod room;
pub mod server;

pub use config::ServerConfig;
pub use generator::random_board;
pub use player::Participant;
pub use room::{Phase, Room, RoomManager, ShotReport};
pub use server::{MessageHandler, ServerEvent, ServerState};
