//! 房间系统
//!
//! 一个房间即一场两人对局：阶段状态机、参战方记录、
//! 当前回合指针与布阵截止定时器。

use std::collections::HashMap;
use std::time::Instant;

use rand::Rng;
use tokio::task::AbortHandle;

use protocol::{Board, GameError, PlayerId, ShotOutcome, PLANES_PER_PLAYER, ROOM_CODE_LEN};

use crate::generator::random_board;
use crate::player::Participant;

/// 房间码字符集（大写字母 + 数字）
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 房间阶段
///
/// 只会单向推进：Waiting -> Placing -> Attacking -> Finished。
/// Finished 进入后房间立即被销毁，外部观察不到该状态的驻留。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 等待第二名玩家加入
    Waiting,
    /// 双方布阵中，截止定时器已启动
    Placing,
    /// 轮流射击中
    Attacking,
    /// 对局结束
    Finished,
}

/// 一次射击的结算结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotReport {
    pub shooter_index: u8,
    pub row: u8,
    pub col: u8,
    pub outcome: ShotOutcome,
    /// 该射击直接终结对局时的胜者
    pub winner: Option<u8>,
    /// 对局继续时轮到的玩家
    pub next_turn: Option<u8>,
}

/// 房间
pub struct Room {
    pub code: String,
    pub phase: Phase,
    /// 先房主（index 0）后加入者（index 1），至多两人
    pub participants: Vec<Participant>,
    /// 当前回合的玩家 index，房主先手
    pub current_turn: u8,
    /// 布阵截止定时器句柄；取消只是清理优化，
    /// 正确性由各转换路径自行复查阶段保证
    pub placement_timer: Option<AbortHandle>,
    pub created_at: Instant,
}

impl Room {
    /// 创建新房间，房主即 index 0
    pub fn new(code: String, creator: PlayerId) -> Self {
        Self {
            code,
            phase: Phase::Waiting,
            participants: vec![Participant::new(creator, 0)],
            current_turn: 0,
            placement_timer: None,
            created_at: Instant::now(),
        }
    }

    /// 检查房间是否已满
    pub fn is_full(&self) -> bool {
        self.participants.len() >= 2
    }

    /// 检查玩家是否在房间中
    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.participants.iter().any(|p| p.id == player_id)
    }

    /// 获取玩家的 index
    pub fn index_of(&self, player_id: PlayerId) -> Option<u8> {
        self.participants
            .iter()
            .find(|p| p.id == player_id)
            .map(|p| p.index)
    }

    /// 获取对手
    pub fn opponent_of(&self, player_id: PlayerId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id != player_id)
    }

    /// 第二名玩家加入，返回其 index
    ///
    /// 加入成功即进入布阵阶段；截止定时器由调用方启动
    pub fn join(&mut self, player_id: PlayerId) -> Result<u8, GameError> {
        if self.is_full() {
            return Err(GameError::RoomFull);
        }
        let index = self.participants.len() as u8;
        self.participants.push(Participant::new(player_id, index));
        self.phase = Phase::Placing;
        Ok(index)
    }

    /// 提交布阵
    ///
    /// 返回 true 表示双方均已就绪、房间已进入攻击阶段
    pub fn submit_placement(&mut self, player_id: PlayerId, board: Board) -> Result<bool, GameError> {
        if self.phase != Phase::Placing {
            return Err(GameError::WrongPhase);
        }
        if !self.has_player(player_id) {
            return Err(GameError::NotInRoom);
        }
        if !board.is_placement_only() {
            return Err(GameError::InvalidBoard);
        }
        let heads = board.heads_remaining();
        if heads != PLANES_PER_PLAYER {
            return Err(GameError::WrongPlaneCount {
                count: heads,
                expected: PLANES_PER_PLAYER,
            });
        }

        let participant = self
            .participants
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(GameError::NotInRoom)?;
        participant.set_board(board);

        if self.is_full() && self.participants.iter().all(|p| p.ready) {
            self.start_attack_phase();
            return Ok(true);
        }
        Ok(false)
    }

    /// 布阵截止
    ///
    /// 定时器触发可能晚于双方就绪提前推进阶段，所以先复查阶段，
    /// 不是 Placing 则整体无效。返回 true 表示本次调用完成了
    /// Placing -> Attacking 的转换
    pub fn expire_placement(&mut self) -> Result<bool, GameError> {
        if self.phase != Phase::Placing {
            return Ok(false);
        }
        for participant in &mut self.participants {
            if !participant.ready {
                participant.set_board(random_board()?);
            }
        }
        self.start_attack_phase();
        Ok(true)
    }

    /// 进入攻击阶段，房主先手
    fn start_attack_phase(&mut self) {
        self.cancel_placement_timer();
        self.phase = Phase::Attacking;
        self.current_turn = 0;
    }

    /// 结算一次射击
    pub fn shoot(&mut self, player_id: PlayerId, row: u8, col: u8) -> Result<ShotReport, GameError> {
        if self.phase != Phase::Attacking {
            return Err(GameError::WrongPhase);
        }
        let shooter_index = self.index_of(player_id).ok_or(GameError::NotInRoom)?;
        if shooter_index != self.current_turn {
            return Err(GameError::NotYourTurn);
        }

        let target = self
            .participants
            .iter_mut()
            .find(|p| p.id != player_id)
            .ok_or(GameError::MissingBoard)?;
        // 攻击阶段的进入保证双方都已持有棋盘，缺失即不变量被破坏
        let board = target.board.as_mut().ok_or(GameError::MissingBoard)?;

        let outcome = board
            .apply_shot(row as usize, col as usize)
            .ok_or(GameError::ShotIgnored { row, col })?;

        if board.heads_remaining() == 0 {
            self.phase = Phase::Finished;
            return Ok(ShotReport {
                shooter_index,
                row,
                col,
                outcome,
                winner: Some(shooter_index),
                next_turn: None,
            });
        }

        self.current_turn = (self.current_turn + 1) % 2;
        Ok(ShotReport {
            shooter_index,
            row,
            col,
            outcome,
            winner: None,
            next_turn: Some(self.current_turn),
        })
    }

    /// 结束对局（弃权、不变量被破坏等终止路径）
    pub fn finish(&mut self) {
        self.cancel_placement_timer();
        self.phase = Phase::Finished;
    }

    /// 取消布阵截止定时器（尽力而为）
    pub fn cancel_placement_timer(&mut self) {
        if let Some(handle) = self.placement_timer.take() {
            handle.abort();
        }
    }
}

/// 房间管理器
///
/// 进程内唯一的房间表；所有终止路径同步移除房间，无需回收扫描
pub struct RoomManager {
    rooms: HashMap<String, Room>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// 房间码统一为大写比较
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_ascii_uppercase()
    }

    /// 生成未被占用的房间码
    fn generate_code(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let code: String = (0..ROOM_CODE_LEN)
                .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
                .collect();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }

    /// 创建房间，返回房间码
    pub fn create(&mut self, creator: PlayerId) -> String {
        let code = self.generate_code();
        let room = Room::new(code.clone(), creator);
        self.rooms.insert(code.clone(), room);
        code
    }

    /// 获取房间
    pub fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(&Self::normalize_code(code))
    }

    /// 获取房间（可变）
    pub fn get_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(&Self::normalize_code(code))
    }

    /// 移除房间
    pub fn remove(&mut self, code: &str) -> Option<Room> {
        self.rooms.remove(&Self::normalize_code(code))
    }

    /// 查找玩家所在的房间码
    pub fn find_player_room(&self, player_id: PlayerId) -> Option<String> {
        self.rooms
            .values()
            .find(|r| r.has_player(player_id))
            .map(|r| r.code.clone())
    }

    /// 获取房间数量
    pub fn count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
