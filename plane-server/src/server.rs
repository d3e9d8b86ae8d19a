//! 服务器主逻辑
//!
//! 所有可变状态由单个协调任务独占：连接读取任务和布阵定时器
//! 只通过同一条事件队列提交 [`ServerEvent`]，天然串行化了
//! 「玩家提交布阵」与「定时器到期」这对竞争写者。

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info};

use protocol::{
    Board, ClientMessage, ErrorCode, GameError, ParticipantInfo, PlayerId, ServerMessage,
    PLANES_PER_PLAYER,
};

use crate::config::ServerConfig;
use crate::room::{Room, RoomManager};

/// 提交给协调任务的事件
#[derive(Debug)]
pub enum ServerEvent {
    /// 新连接注册
    Connected {
        player_id: PlayerId,
        tx: mpsc::Sender<ServerMessage>,
    },
    /// 收到客户端消息
    Message {
        player_id: PlayerId,
        message: ClientMessage,
    },
    /// 连接断开
    Disconnected { player_id: PlayerId },
    /// 布阵倒计时到期
    PlacementExpired { code: String },
}

/// 服务器状态
pub struct ServerState {
    pub config: ServerConfig,
    pub rooms: RoomManager,
    /// 玩家 ID -> 消息发送通道
    pub connections: HashMap<PlayerId, mpsc::Sender<ServerMessage>>,
    /// 事件队列入口，定时器任务用它回报到期
    pub event_tx: mpsc::Sender<ServerEvent>,
}

impl ServerState {
    pub fn new(config: ServerConfig, event_tx: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            config,
            rooms: RoomManager::new(),
            connections: HashMap::new(),
            event_tx,
        }
    }

    /// 发送消息给玩家
    pub async fn send_to_player(&self, player_id: PlayerId, msg: ServerMessage) {
        if let Some(tx) = self.connections.get(&player_id) {
            let _ = tx.send(msg).await;
        }
    }
}

/// 待发送的消息
///
/// 广播目标在入队时就展开成具体玩家，使得终止路径可以
/// 先入队通知、再同步销毁房间
struct PendingMessages {
    messages: Vec<(PlayerId, ServerMessage)>,
}

impl PendingMessages {
    fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    fn send(&mut self, player_id: PlayerId, msg: ServerMessage) {
        self.messages.push((player_id, msg));
    }

    fn broadcast(&mut self, room: &Room, msg: ServerMessage) {
        for participant in &room.participants {
            self.messages.push((participant.id, msg.clone()));
        }
    }

    async fn flush(self, state: &ServerState) {
        for (player_id, msg) in self.messages {
            state.send_to_player(player_id, msg).await;
        }
    }
}

/// 消息处理器
pub struct MessageHandler;

impl MessageHandler {
    /// 处理客户端消息
    pub async fn handle(
        state: &mut ServerState,
        player_id: PlayerId,
        msg: ClientMessage,
    ) -> Option<ServerMessage> {
        let mut pending = PendingMessages::new();

        let result = match msg {
            ClientMessage::CreateRoom => Self::handle_create_room(state, player_id),
            ClientMessage::JoinRoom { code } => {
                Self::handle_join_room(state, &mut pending, player_id, code)
            }
            ClientMessage::SubmitPlacement { code, board } => {
                Self::handle_submit_placement(state, &mut pending, player_id, code, board)
            }
            ClientMessage::Shoot { code, row, col } => {
                Self::handle_shoot(state, &mut pending, player_id, code, row, col)
            }
            ClientMessage::Ping => Some(ServerMessage::Pong),
        };

        pending.flush(state).await;

        result
    }

    /// 处理创建房间
    fn handle_create_room(state: &mut ServerState, player_id: PlayerId) -> Option<ServerMessage> {
        let code = state.rooms.create(player_id);
        info!("房间 {} 已创建，房主为玩家 {}", code, player_id);
        Some(ServerMessage::RoomCreated { code })
    }

    /// 处理加入房间
    fn handle_join_room(
        state: &mut ServerState,
        pending: &mut PendingMessages,
        player_id: PlayerId,
        code: String,
    ) -> Option<ServerMessage> {
        let code = RoomManager::normalize_code(&code);

        let room = match state.rooms.get_mut(&code) {
            Some(r) => r,
            None => {
                return Some(ServerMessage::Error {
                    code: ErrorCode::RoomNotFound,
                    message: "房间不存在".to_string(),
                });
            }
        };

        let player_index = match room.join(player_id) {
            Ok(index) => index,
            Err(_) => {
                return Some(ServerMessage::Error {
                    code: ErrorCode::RoomFull,
                    message: "房间已满".to_string(),
                });
            }
        };

        info!("玩家 {} 加入房间 {}，进入布阵阶段", player_id, code);

        // 启动布阵截止定时器：到期事件走协调队列，
        // 与客户端消息串行结算
        let limit_ms = state.config.placement_limit_ms;
        let event_tx = state.event_tx.clone();
        let timer_code = code.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(limit_ms)).await;
            let _ = event_tx
                .send(ServerEvent::PlacementExpired { code: timer_code })
                .await;
        });
        room.placement_timer = Some(handle.abort_handle());

        let participants = room
            .participants
            .iter()
            .map(|p| ParticipantInfo { index: p.index })
            .collect();
        pending.broadcast(
            room,
            ServerMessage::MatchStarted {
                code: code.clone(),
                participants,
            },
        );
        pending.broadcast(room, ServerMessage::PlacementTimerStarted { limit_ms });

        Some(ServerMessage::RoomJoined { code, player_index })
    }

    /// 处理布阵提交
    fn handle_submit_placement(
        state: &mut ServerState,
        pending: &mut PendingMessages,
        player_id: PlayerId,
        code: String,
        board: Board,
    ) -> Option<ServerMessage> {
        let code = RoomManager::normalize_code(&code);

        let room = match state.rooms.get_mut(&code) {
            Some(r) => r,
            None => {
                return Some(ServerMessage::Error {
                    code: ErrorCode::RoomNotFound,
                    message: "房间不存在".to_string(),
                });
            }
        };

        match room.submit_placement(player_id, board) {
            Ok(transitioned) => {
                info!("房间 {}: 玩家 {} 完成布阵", code, player_id);

                if let Some(opponent) = room.opponent_of(player_id) {
                    pending.send(opponent.id, ServerMessage::OpponentReady);
                }

                if transitioned {
                    info!("房间 {}: 双方就绪，进入攻击阶段", code);
                    pending.broadcast(room, ServerMessage::AttackPhaseStarted);
                    pending.broadcast(
                        room,
                        ServerMessage::TurnChanged {
                            player_index: room.current_turn,
                        },
                    );
                }
                None
            }
            Err(GameError::WrongPlaneCount { .. }) => Some(ServerMessage::Error {
                code: ErrorCode::WrongPieceCount,
                message: format!("必须放置 {} 架飞机", PLANES_PER_PLAYER),
            }),
            Err(GameError::InvalidBoard) => Some(ServerMessage::Error {
                code: ErrorCode::InvalidBoard,
                message: "棋盘数据非法".to_string(),
            }),
            // 阶段不符/不在房间中：竞态下的正常噪声，静默忽略
            Err(_) => None,
        }
    }

    /// 处理射击
    fn handle_shoot(
        state: &mut ServerState,
        pending: &mut PendingMessages,
        player_id: PlayerId,
        code: String,
        row: u8,
        col: u8,
    ) -> Option<ServerMessage> {
        let code = RoomManager::normalize_code(&code);

        let room = match state.rooms.get_mut(&code) {
            Some(r) => r,
            None => {
                // 房间已随终局或掉线销毁，迟到的射击按不存在处理
                return Some(ServerMessage::Error {
                    code: ErrorCode::RoomNotFound,
                    message: "房间不存在".to_string(),
                });
            }
        };

        let report = match room.shoot(player_id, row, col) {
            Ok(report) => report,
            Err(GameError::MissingBoard) => {
                // 不变量被破坏：终止该房间，但不影响其他房间
                error!("房间 {}: 攻击阶段缺少对手棋盘，强制终止", code);
                Self::abort_room(state, pending, &code);
                return None;
            }
            // 阶段不符/回合不符/重复射击：静默忽略
            Err(_) => return None,
        };

        pending.broadcast(
            room,
            ServerMessage::ShotResult {
                shooter_index: report.shooter_index,
                row,
                col,
                outcome: report.outcome,
            },
        );

        if let Some(winner_index) = report.winner {
            info!("房间 {}: 对局结束，胜者为玩家 {}", code, winner_index);
            pending.broadcast(room, ServerMessage::MatchOver { winner_index });
            state.rooms.remove(&code);
        } else if let Some(player_index) = report.next_turn {
            pending.broadcast(room, ServerMessage::TurnChanged { player_index });
        }

        None
    }

    /// 处理布阵倒计时到期
    pub async fn handle_placement_expired(state: &mut ServerState, code: String) {
        let mut pending = PendingMessages::new();
        Self::expire_placement(state, &mut pending, &code);
        pending.flush(state).await;
    }

    fn expire_placement(state: &mut ServerState, pending: &mut PendingMessages, code: &str) {
        // 房间可能已被胜负或掉线销毁
        let room = match state.rooms.get_mut(code) {
            Some(r) => r,
            None => return,
        };

        match room.expire_placement() {
            Ok(true) => {
                info!("房间 {}: 布阵超时，自动补全并进入攻击阶段", code);
                pending.broadcast(room, ServerMessage::AttackPhaseStarted);
                pending.broadcast(
                    room,
                    ServerMessage::TurnChanged {
                        player_index: room.current_turn,
                    },
                );
            }
            // 双方就绪已提前推进了阶段，迟到的定时器无事可做
            Ok(false) => {}
            Err(e) => {
                error!("房间 {}: 随机布阵失败: {}，强制终止", code, e);
                Self::abort_room(state, pending, code);
            }
        }
    }

    /// 处理玩家断线
    ///
    /// 掉线不是错误而是一等终止转换：对局立即结束，
    /// 留守方按对手弃权获知结果
    pub async fn handle_disconnect(state: &mut ServerState, player_id: PlayerId) {
        let mut pending = PendingMessages::new();

        if let Some(code) = state.rooms.find_player_room(player_id) {
            if let Some(mut room) = state.rooms.remove(&code) {
                room.finish();
                if let Some(opponent) = room.opponent_of(player_id) {
                    pending.send(opponent.id, ServerMessage::OpponentLeft);
                }
                info!("房间 {}: 玩家 {} 离开，房间已销毁", code, player_id);
            }
        }

        state.connections.remove(&player_id);

        pending.flush(state).await;
    }

    /// 终止房间并通知双方内部错误
    fn abort_room(state: &mut ServerState, pending: &mut PendingMessages, code: &str) {
        if let Some(mut room) = state.rooms.remove(code) {
            room.finish();
            for participant in &room.participants {
                pending.send(
                    participant.id,
                    ServerMessage::Error {
                        code: ErrorCode::InternalError,
                        message: "服务端内部错误，对局已终止".to_string(),
                    },
                );
            }
        }
    }
}

/// 协调任务主循环：独占服务器状态，串行消费所有事件
pub async fn run(mut state: ServerState, mut events: mpsc::Receiver<ServerEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ServerEvent::Connected { player_id, tx } => {
                state.connections.insert(player_id, tx);
            }
            ServerEvent::Message { player_id, message } => {
                if let Some(reply) = MessageHandler::handle(&mut state, player_id, message).await {
                    state.send_to_player(player_id, reply).await;
                }
            }
            ServerEvent::Disconnected { player_id } => {
                MessageHandler::handle_disconnect(&mut state, player_id).await;
            }
            ServerEvent::PlacementExpired { code } => {
                MessageHandler::handle_placement_expired(&mut state, code).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::Orientation;

    fn new_state() -> (ServerState, mpsc::Receiver<ServerEvent>) {
        let (event_tx, event_rx) = mpsc::channel(64);
        let state = ServerState::new(ServerConfig::default(), event_tx);
        (state, event_rx)
    }

    fn register(state: &mut ServerState, player_id: PlayerId) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(64);
        state.connections.insert(player_id, tx);
        rx
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    /// 机头位于 (0,5) (5,2) (5,7) 的合法布阵
    fn valid_board() -> Board {
        let mut board = Board::empty();
        board.place(0, 5, Orientation::Down);
        board.place(5, 2, Orientation::Down);
        board.place(5, 7, Orientation::Down);
        board
    }

    /// 只有 2 架飞机的非法布阵
    fn short_board() -> Board {
        let mut board = Board::empty();
        board.place(0, 5, Orientation::Down);
        board.place(5, 2, Orientation::Down);
        board
    }

    /// 建房 + 加入，返回房间码
    async fn setup_room(state: &mut ServerState) -> String {
        let created = MessageHandler::handle(state, 1, ClientMessage::CreateRoom).await;
        let code = match created {
            Some(ServerMessage::RoomCreated { code }) => code,
            other => panic!("Unexpected reply: {:?}", other),
        };

        let joined =
            MessageHandler::handle(state, 2, ClientMessage::JoinRoom { code: code.clone() }).await;
        assert!(matches!(
            joined,
            Some(ServerMessage::RoomJoined { player_index: 1, .. })
        ));

        code
    }

    fn count_attack_started(messages: &[ServerMessage]) -> usize {
        messages
            .iter()
            .filter(|m| matches!(m, ServerMessage::AttackPhaseStarted))
            .count()
    }

    #[tokio::test]
    async fn test_create_and_join() {
        let (mut state, _event_rx) = new_state();
        let mut rx1 = register(&mut state, 1);
        let mut rx2 = register(&mut state, 2);

        let code = setup_room(&mut state).await;

        // 双方都收到对局开始与倒计时通知
        let msgs1 = drain(&mut rx1);
        assert!(msgs1
            .iter()
            .any(|m| matches!(m, ServerMessage::MatchStarted { .. })));
        assert!(msgs1
            .iter()
            .any(|m| matches!(m, ServerMessage::PlacementTimerStarted { .. })));

        let msgs2 = drain(&mut rx2);
        match msgs2
            .iter()
            .find(|m| matches!(m, ServerMessage::MatchStarted { .. }))
        {
            Some(ServerMessage::MatchStarted { code: c, participants }) => {
                assert_eq!(c, &code);
                let indexes: Vec<u8> = participants.iter().map(|p| p.index).collect();
                assert_eq!(indexes, vec![0, 1]);
            }
            other => panic!("Missing MatchStarted: {:?}", other),
        }

        assert_eq!(state.rooms.get(&code).unwrap().participants.len(), 2);
    }

    #[tokio::test]
    async fn test_join_missing_room() {
        let (mut state, _event_rx) = new_state();

        let reply = MessageHandler::handle(
            &mut state,
            1,
            ClientMessage::JoinRoom {
                code: "ZZZZZ".to_string(),
            },
        )
        .await;

        assert!(matches!(
            reply,
            Some(ServerMessage::Error {
                code: ErrorCode::RoomNotFound,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_join_full_room() {
        let (mut state, _event_rx) = new_state();
        let code = setup_room(&mut state).await;

        let reply =
            MessageHandler::handle(&mut state, 3, ClientMessage::JoinRoom { code }).await;
        assert!(matches!(
            reply,
            Some(ServerMessage::Error {
                code: ErrorCode::RoomFull,
                ..
            })
        ));
    }

    /// 场景 A：双方提交合法布阵后进入攻击阶段，房主先手
    #[tokio::test]
    async fn test_both_submit_starts_attack() {
        let (mut state, _event_rx) = new_state();
        let mut rx1 = register(&mut state, 1);
        let mut rx2 = register(&mut state, 2);
        let code = setup_room(&mut state).await;
        drain(&mut rx1);
        drain(&mut rx2);

        let reply = MessageHandler::handle(
            &mut state,
            1,
            ClientMessage::SubmitPlacement {
                code: code.clone(),
                board: valid_board(),
            },
        )
        .await;
        assert!(reply.is_none());

        // 对手收到就绪通知，阶段未变
        let msgs2 = drain(&mut rx2);
        assert!(msgs2.iter().any(|m| matches!(m, ServerMessage::OpponentReady)));
        assert_eq!(count_attack_started(&msgs2), 0);

        MessageHandler::handle(
            &mut state,
            2,
            ClientMessage::SubmitPlacement {
                code: code.clone(),
                board: valid_board(),
            },
        )
        .await;

        // 双方收到攻击开始与先手通知
        for rx in [&mut rx1, &mut rx2] {
            let msgs = drain(rx);
            assert_eq!(count_attack_started(&msgs), 1);
            assert!(msgs
                .iter()
                .any(|m| matches!(m, ServerMessage::TurnChanged { player_index: 0 })));
        }
    }

    /// 场景 B：飞机数量不对的布阵被拒绝，状态不变，对手不收到任何通知
    #[tokio::test]
    async fn test_submit_wrong_count_rejected() {
        let (mut state, _event_rx) = new_state();
        let _rx1 = register(&mut state, 1);
        let mut rx2 = register(&mut state, 2);
        let code = setup_room(&mut state).await;
        drain(&mut rx2);

        let reply = MessageHandler::handle(
            &mut state,
            1,
            ClientMessage::SubmitPlacement {
                code: code.clone(),
                board: short_board(),
            },
        )
        .await;

        assert!(matches!(
            reply,
            Some(ServerMessage::Error {
                code: ErrorCode::WrongPieceCount,
                ..
            })
        ));
        assert!(drain(&mut rx2).is_empty());
        assert_eq!(
            state.rooms.get(&code).unwrap().phase,
            crate::room::Phase::Placing
        );
    }

    /// 场景 C（定时器先到）：超时自动补全，迟到的提交不再生效
    #[tokio::test]
    async fn test_expire_then_late_submit() {
        let (mut state, _event_rx) = new_state();
        let mut rx1 = register(&mut state, 1);
        let mut rx2 = register(&mut state, 2);
        let code = setup_room(&mut state).await;
        drain(&mut rx1);
        drain(&mut rx2);

        MessageHandler::handle(
            &mut state,
            1,
            ClientMessage::SubmitPlacement {
                code: code.clone(),
                board: valid_board(),
            },
        )
        .await;

        // 定时器到期：未提交方获得自动布阵，进入攻击阶段
        MessageHandler::handle_placement_expired(&mut state, code.clone()).await;

        {
            let room = state.rooms.get(&code).unwrap();
            assert_eq!(room.phase, crate::room::Phase::Attacking);
            let generated = room.participants[1].board.as_ref().unwrap();
            assert_eq!(generated.heads_remaining(), PLANES_PER_PLAYER);
        }

        // 迟到的提交：整体无效，不产生第二次转换
        let reply = MessageHandler::handle(
            &mut state,
            2,
            ClientMessage::SubmitPlacement {
                code: code.clone(),
                board: valid_board(),
            },
        )
        .await;
        assert!(reply.is_none());

        assert_eq!(count_attack_started(&drain(&mut rx1)), 1);
        assert_eq!(count_attack_started(&drain(&mut rx2)), 1);
    }

    /// 场景 C（提交先到）：双方就绪后迟到的定时器是空操作
    #[tokio::test]
    async fn test_late_timer_after_both_ready() {
        let (mut state, _event_rx) = new_state();
        let mut rx1 = register(&mut state, 1);
        let mut rx2 = register(&mut state, 2);
        let code = setup_room(&mut state).await;

        for player_id in [1u64, 2u64] {
            MessageHandler::handle(
                &mut state,
                player_id,
                ClientMessage::SubmitPlacement {
                    code: code.clone(),
                    board: valid_board(),
                },
            )
            .await;
        }
        drain(&mut rx1);
        drain(&mut rx2);

        // 取消与触发本身可能竞争，到期路径必须自己复查阶段
        MessageHandler::handle_placement_expired(&mut state, code.clone()).await;

        assert!(drain(&mut rx1).is_empty());
        assert!(drain(&mut rx2).is_empty());
        assert_eq!(
            state.rooms.get(&code).unwrap().phase,
            crate::room::Phase::Attacking
        );
    }

    /// 场景 D：机头命中立即削减对方机头数并换边；第三个机头命中触发终局
    #[tokio::test]
    async fn test_head_hit_turn_and_win() {
        let (mut state, _event_rx) = new_state();
        let mut rx1 = register(&mut state, 1);
        let mut rx2 = register(&mut state, 2);
        let code = setup_room(&mut state).await;

        for player_id in [1u64, 2u64] {
            MessageHandler::handle(
                &mut state,
                player_id,
                ClientMessage::SubmitPlacement {
                    code: code.clone(),
                    board: valid_board(),
                },
            )
            .await;
        }
        drain(&mut rx1);
        drain(&mut rx2);

        // 房主命中对方机头 (0,5)
        MessageHandler::handle(
            &mut state,
            1,
            ClientMessage::Shoot {
                code: code.clone(),
                row: 0,
                col: 5,
            },
        )
        .await;

        {
            let room = state.rooms.get(&code).unwrap();
            let target = room.participants[1].board.as_ref().unwrap();
            // 机身未动，机头计数已减一
            assert_eq!(target.heads_remaining(), 2);
            assert_eq!(room.current_turn, 1);
        }

        let msgs1 = drain(&mut rx1);
        assert!(msgs1.iter().any(|m| matches!(
            m,
            ServerMessage::ShotResult {
                shooter_index: 0,
                row: 0,
                col: 5,
                outcome: protocol::ShotOutcome::HitHead,
            }
        )));
        assert!(msgs1
            .iter()
            .any(|m| matches!(m, ServerMessage::TurnChanged { player_index: 1 })));

        // 交替射击直至房主命中第三个机头
        MessageHandler::handle(&mut state, 2, ClientMessage::Shoot { code: code.clone(), row: 9, col: 0 }).await;
        MessageHandler::handle(&mut state, 1, ClientMessage::Shoot { code: code.clone(), row: 5, col: 2 }).await;
        MessageHandler::handle(&mut state, 2, ClientMessage::Shoot { code: code.clone(), row: 9, col: 1 }).await;
        MessageHandler::handle(&mut state, 1, ClientMessage::Shoot { code: code.clone(), row: 5, col: 7 }).await;

        let final_msgs = drain(&mut rx2);
        assert!(final_msgs
            .iter()
            .any(|m| matches!(m, ServerMessage::MatchOver { winner_index: 0 })));
        // 终局后不再有回合切换
        let turn_after_win = final_msgs.iter().rev().position(|m| {
            matches!(m, ServerMessage::TurnChanged { .. })
        });
        let win_pos = final_msgs
            .iter()
            .rev()
            .position(|m| matches!(m, ServerMessage::MatchOver { .. }))
            .unwrap();
        if let Some(turn_pos) = turn_after_win {
            assert!(turn_pos > win_pos);
        }

        // 房间随胜负广播同步销毁
        assert!(state.rooms.get(&code).is_none());

        // 终局后的迟到射击按房间不存在拒绝
        let reply = MessageHandler::handle(
            &mut state,
            2,
            ClientMessage::Shoot {
                code: code.clone(),
                row: 0,
                col: 0,
            },
        )
        .await;
        assert!(matches!(
            reply,
            Some(ServerMessage::Error {
                code: ErrorCode::RoomNotFound,
                ..
            })
        ));
    }

    /// 非当前回合的射击被静默忽略
    #[tokio::test]
    async fn test_shoot_out_of_turn_ignored() {
        let (mut state, _event_rx) = new_state();
        let mut rx1 = register(&mut state, 1);
        let mut rx2 = register(&mut state, 2);
        let code = setup_room(&mut state).await;

        for player_id in [1u64, 2u64] {
            MessageHandler::handle(
                &mut state,
                player_id,
                ClientMessage::SubmitPlacement {
                    code: code.clone(),
                    board: valid_board(),
                },
            )
            .await;
        }
        drain(&mut rx1);
        drain(&mut rx2);

        // 加入者先手射击：不是他的回合
        let reply = MessageHandler::handle(
            &mut state,
            2,
            ClientMessage::Shoot {
                code: code.clone(),
                row: 0,
                col: 0,
            },
        )
        .await;

        assert!(reply.is_none());
        assert!(drain(&mut rx1).is_empty());
        assert!(drain(&mut rx2).is_empty());
        assert_eq!(state.rooms.get(&code).unwrap().current_turn, 0);
    }

    /// 场景 E：对手掉线，留守方收到离开通知，房间销毁
    #[tokio::test]
    async fn test_disconnect_mid_attack() {
        let (mut state, _event_rx) = new_state();
        let mut rx1 = register(&mut state, 1);
        let _rx2 = register(&mut state, 2);
        let code = setup_room(&mut state).await;

        for player_id in [1u64, 2u64] {
            MessageHandler::handle(
                &mut state,
                player_id,
                ClientMessage::SubmitPlacement {
                    code: code.clone(),
                    board: valid_board(),
                },
            )
            .await;
        }
        drain(&mut rx1);

        MessageHandler::handle_disconnect(&mut state, 2).await;

        let msgs1 = drain(&mut rx1);
        assert!(msgs1.iter().any(|m| matches!(m, ServerMessage::OpponentLeft)));
        assert!(state.rooms.get(&code).is_none());
        assert!(!state.connections.contains_key(&2));

        // 指向旧房间码的迟到射击按房间不存在拒绝
        let reply = MessageHandler::handle(
            &mut state,
            1,
            ClientMessage::Shoot {
                code: code.clone(),
                row: 0,
                col: 0,
            },
        )
        .await;
        assert!(matches!(
            reply,
            Some(ServerMessage::Error {
                code: ErrorCode::RoomNotFound,
                ..
            })
        ));
    }

    /// 布阵阶段掉线后迟到的定时器：房间已销毁，空操作
    #[tokio::test]
    async fn test_timer_after_disconnect_is_noop() {
        let (mut state, _event_rx) = new_state();
        let mut rx1 = register(&mut state, 1);
        let _rx2 = register(&mut state, 2);
        let code = setup_room(&mut state).await;
        drain(&mut rx1);

        MessageHandler::handle_disconnect(&mut state, 2).await;
        drain(&mut rx1);
        assert!(state.rooms.get(&code).is_none());

        MessageHandler::handle_placement_expired(&mut state, code).await;
        assert!(drain(&mut rx1).is_empty());
    }

    /// 等待阶段掉线：房间销毁，无人需要通知
    #[tokio::test]
    async fn test_disconnect_while_waiting() {
        let (mut state, _event_rx) = new_state();
        let _rx1 = register(&mut state, 1);

        let created = MessageHandler::handle(&mut state, 1, ClientMessage::CreateRoom).await;
        let code = match created {
            Some(ServerMessage::RoomCreated { code }) => code,
            other => panic!("Unexpected reply: {:?}", other),
        };

        MessageHandler::handle_disconnect(&mut state, 1).await;
        assert!(state.rooms.get(&code).is_none());
        assert_eq!(state.rooms.count(), 0);
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let (mut state, _event_rx) = new_state();
        let reply = MessageHandler::handle(&mut state, 1, ClientMessage::Ping).await;
        assert!(matches!(reply, Some(ServerMessage::Pong)));
    }
}
