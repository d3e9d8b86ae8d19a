use anyhow::Result;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plane_server::server::{self, ServerEvent, ServerState};
use plane_server::ServerConfig;
use protocol::{ClientMessage, FrameReader, FrameWriter, PlayerId, ProtocolError, ServerMessage};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("plane_server=debug".parse()?))
        .init();

    // 可选的 JSON 配置文件作为第一个参数
    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };

    info!("飞机大战服务端启动中...");

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("监听地址: {}", config.bind_addr());

    let (event_tx, event_rx) = mpsc::channel::<ServerEvent>(256);
    let state = ServerState::new(config, event_tx.clone());
    tokio::spawn(server::run(state, event_rx));

    let mut next_player_id: PlayerId = 1;
    loop {
        let (stream, addr) = listener.accept().await?;
        let player_id = next_player_id;
        next_player_id += 1;

        info!("玩家 {} 已连接: {}", player_id, addr);
        stream.set_nodelay(true)?;

        let (read_half, write_half) = stream.into_split();
        let (out_tx, out_rx) = mpsc::channel::<ServerMessage>(64);

        if event_tx
            .send(ServerEvent::Connected {
                player_id,
                tx: out_tx,
            })
            .await
            .is_err()
        {
            anyhow::bail!("协调任务已退出");
        }

        tokio::spawn(write_loop(player_id, write_half, out_rx));
        tokio::spawn(read_loop(player_id, read_half, event_tx.clone()));
    }
}

/// 按连接读取客户端消息并提交给协调任务；
/// 读取失败一律视为断线
async fn read_loop(
    player_id: PlayerId,
    read_half: OwnedReadHalf,
    event_tx: mpsc::Sender<ServerEvent>,
) {
    let mut reader = FrameReader::new(read_half);
    loop {
        match reader.read_frame::<ClientMessage>().await {
            Ok(message) => {
                if event_tx
                    .send(ServerEvent::Message { player_id, message })
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Err(ProtocolError::ConnectionClosed) => {
                info!("玩家 {} 断开连接", player_id);
                break;
            }
            Err(e) => {
                debug!("玩家 {} 连接读取失败: {}", player_id, e);
                break;
            }
        }
    }
    let _ = event_tx.send(ServerEvent::Disconnected { player_id }).await;
}

/// 把协调任务排出的消息写回连接
async fn write_loop(
    player_id: PlayerId,
    write_half: OwnedWriteHalf,
    mut out_rx: mpsc::Receiver<ServerMessage>,
) {
    let mut writer = FrameWriter::new(write_half);
    while let Some(msg) = out_rx.recv().await {
        if let Err(e) = writer.write_frame(&msg).await {
            debug!("玩家 {} 连接写入失败: {}", player_id, e);
            break;
        }
    }
}
