use super::{Session, SessionMap, WebSocketServerConfig};
use crate::{
    cron::{Cron, CronConfig},
    error::ServerError,
};
use axum::{
    Router,
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, close_code},
    },
    response::Response,
    routing::get,
};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt, stream::SplitStream};
use serde::Deserialize;
use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::{
    net::TcpListener,
    select,
    sync::{Notify, broadcast, mpsc},
    time::timeout,
};
use tracing::{Instrument, debug, debug_span, error, info, warn};

#[derive(Debug, Deserialize)]
struct Identity {
    #[serde(default)]
    uid: String,
    #[serde(default)]
    tid: String,
}

/// Team gateway: accepts `/?uid=..&tid=..` upgrades and pushes a fixed
/// payload to every session on a schedule.
#[derive(Clone)]
pub struct Server {
    addr: SocketAddr,
    push: Cron,
    push_payload: Bytes,
    msg_buf: usize,
    write_timeout: Duration,

    sessions: Arc<SessionMap>,
    id: Arc<AtomicU64>,
    close: broadcast::Sender<()>,

    // upgraded sockets still being served
    active: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

struct ActiveGuard {
    active: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

impl Server {
    pub fn new(cfg: &WebSocketServerConfig) -> Result<Self, ServerError> {
        let addr = format!("{}:{}", cfg.host, cfg.port)
            .parse::<SocketAddr>()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", cfg.host, cfg.port)))?;

        if cfg.msg_buf == 0 {
            return Err(ServerError::ZeroBuffer);
        }

        let write_timeout = duration_str::parse(&cfg.write_timeout).map_err(|e| {
            ServerError::InvalidDuration {
                field: "write_timeout",
                value: cfg.write_timeout.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut cron_cfg = CronConfig::default();
        cron_cfg.run_after_start = cfg.push_interval.clone();
        cron_cfg.interval = cfg.push_interval.clone();
        let push = Cron::new("PUSH", &cron_cfg)?;

        let (close, _) = broadcast::channel(1);

        Ok(Server {
            addr,
            push,
            push_payload: Bytes::from(cfg.push_payload.clone()),
            msg_buf: cfg.msg_buf,
            write_timeout,
            sessions: Arc::new(SessionMap::new()),
            id: Arc::new(AtomicU64::new(0)),
            close,
            active: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        })
    }

    pub fn sessions(&self) -> Arc<SessionMap> {
        self.sessions.clone()
    }

    /// Number of upgraded sockets whose task has not finished yet.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// The upgrade route, for mounting inside another axum app.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(upgrade))
            .with_state(self.clone())
    }

    /// Binds the listener, spawns the serve loop and the pusher, and returns
    /// the bound address.
    pub async fn run(&self) -> Result<SocketAddr, ServerError> {
        let bind_err = |source| ServerError::Bind {
            addr: self.addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(self.addr).await.map_err(bind_err)?;
        let local = listener.local_addr().map_err(bind_err)?;
        info!("Websocket Server host on: {}", local);

        let mut serve_done = self.close.subscribe();
        let router = self.router();
        tokio::spawn(
            async move {
                let shutdown = async move {
                    _ = serve_done.recv().await;
                };
                if let Err(e) = axum::serve(listener, router)
                    .with_graceful_shutdown(shutdown)
                    .await
                {
                    error!("serve failed: {}", e);
                }
                debug!("SERVER STOP - {}", local);
            }
            .instrument(debug_span!("serve")),
        );

        let push_done = self.close.subscribe();
        tokio::spawn(
            self.clone()
                .push_loop(push_done)
                .instrument(debug_span!("push")),
        );

        Ok(local)
    }

    /// Closes every session with 1001 and waits, up to `write_timeout`, for
    /// their close handshakes to finish. Returns false on timeout.
    pub async fn stop(&self) -> bool {
        _ = self.close.send(());
        self.sessions.close().await;

        let finished = timeout(self.write_timeout, async {
            loop {
                let idle = self.idle.notified();
                if self.active() == 0 {
                    return;
                }
                idle.await;
            }
        })
        .await
        .is_ok();

        match finished {
            true => info!("server closed"),
            false => warn!("server closed by timeout, {} sessions left", self.active()),
        }
        finished
    }

    /// Reads until the peer's side of the close handshake is done so that
    /// tungstenite gets to flush its queued close reply.
    async fn finish_close(&self, stream: &mut SplitStream<WebSocket>) {
        _ = timeout(self.write_timeout, async {
            while let Some(Ok(_)) = stream.next().await {}
        })
        .await;
    }

    async fn push_loop(self, mut done: broadcast::Receiver<()>) {
        let mut ticker = self.push.ticker();
        loop {
            select! {
                _ = done.recv() => return,

                _ = ticker.tick() => {
                    let n = self.sessions.push_all(self.push_payload.clone()).await;
                    debug!("pushed to {} sessions", n);
                }
            }
        }
    }

    async fn handle_socket(&self, mut socket: WebSocket, identity: Identity) {
        self.active.fetch_add(1, Ordering::SeqCst);
        let _guard = ActiveGuard {
            active: self.active.clone(),
            idle: self.idle.clone(),
        };

        let Identity { uid, tid } = identity;
        if uid.is_empty() || tid.is_empty() {
            error!("empty team id or user id, tid: {:?}, uid: {:?}", tid, uid);
            let frame = CloseFrame {
                code: close_code::POLICY,
                reason: Utf8Bytes::from_static("uid and tid are required"),
            };
            if socket.send(Message::Close(Some(frame))).await.is_ok() {
                // wait for the peer's close reply
                _ = timeout(self.write_timeout, async {
                    while let Some(Ok(msg)) = socket.recv().await {
                        if let Message::Close(_) = msg {
                            break;
                        }
                    }
                })
                .await;
            }
            return;
        }

        let id = self.id.fetch_add(1, Ordering::Relaxed);
        let (tx, mut rx) = mpsc::channel(self.msg_buf);
        // greet right away, the pusher takes over afterwards
        _ = tx.try_send(self.push_payload.clone());
        self.sessions.add(Session::new(id, &tid, &uid, tx)).await;
        debug!(tid = %tid, uid = %uid, id, "session opened");

        let mut done = self.close.subscribe();
        let (mut sink, mut stream) = socket.split();
        loop {
            select! {
                _ = done.recv() => {
                    if sink.send(away("server closing")).await.is_ok() {
                        self.finish_close(&mut stream).await;
                    }
                    break;
                }

                payload = rx.recv() => match payload {
                    Some(payload) => {
                        match timeout(self.write_timeout, sink.send(Message::Binary(payload))).await {
                            Ok(Ok(_)) => {}
                            Ok(Err(e)) => {
                                warn!(tid = %tid, uid = %uid, "write failed: {}", e);
                                break;
                            }
                            Err(_) => {
                                warn!(tid = %tid, uid = %uid, "write timed out");
                                break;
                            }
                        }
                    }
                    // replaced by a newer session for the same user, or closed
                    None => {
                        if sink.send(away("session closed")).await.is_ok() {
                            self.finish_close(&mut stream).await;
                        }
                        break;
                    }
                },

                frame = stream.next() => match frame {
                    Some(Ok(Message::Binary(data))) => {
                        info!(tid = %tid, uid = %uid, "message: {}", String::from_utf8_lossy(&data));
                    }
                    Some(Ok(Message::Text(text))) => {
                        error!(tid = %tid, uid = %uid, "got unexpected text message: {}", text.as_str());
                    }
                    Some(Ok(Message::Close(_))) => {
                        self.finish_close(&mut stream).await;
                        break;
                    }
                    None => break,
                    // pongs are sent by the websocket layer
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(tid = %tid, uid = %uid, "read failed: {}", e);
                        break;
                    }
                },
            }
        }

        self.sessions.remove(&tid, &uid, id).await;
        debug!(tid = %tid, uid = %uid, id, "session closed");
    }
}

fn away(reason: &'static str) -> Message {
    Message::Close(Some(CloseFrame {
        code: close_code::AWAY,
        reason: Utf8Bytes::from_static(reason),
    }))
}

async fn upgrade(
    State(server): State<Server>,
    Query(identity): Query<Identity>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| async move { server.handle_socket(socket, identity).await })
}
