use super::{EventHandler, WebSocketClientConfig};
use crate::{
    async_fn::{AsyncFn, wrap_fn},
    cron::{Cron, CronConfig},
    error::ClientError,
    log::WIRE_TARGET,
};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use std::sync::Arc;
use tokio::{
    net::TcpStream,
    select,
    sync::{
        Mutex,
        mpsc::{Receiver, Sender, error::SendError},
    },
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        Error as WsError, Message, Utf8Bytes,
        handshake::client::Response,
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};
use tracing::{debug, error, warn};
use url::Url;

type Conn = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Sink = SplitSink<Conn, Message>;

/// Close code and reason carried by the peer's close frame, if it sent one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: Option<u16>,
    pub reason: Option<String>,
}

#[derive(Clone)]
pub struct Client {
    name: String,
    url: Url,
    trace: bool,
    ping: Cron,

    on_open: Arc<AsyncFn<(), ()>>,
    on_message: Arc<AsyncFn<String, ()>>,
    on_error: Arc<AsyncFn<ClientError, ()>>,
    on_close: Arc<AsyncFn<CloseInfo, ()>>,
    on_pong: Arc<AsyncFn<Bytes, ()>>,

    client_close: Arc<Sender<()>>,
    client_done: Arc<Mutex<Receiver<()>>>,

    message_sender: Arc<Sender<Message>>,
    message_receiver: Arc<Mutex<Receiver<Message>>>,
}

fn build_url(cfg: &WebSocketClientConfig) -> Result<Url, ClientError> {
    let mut url = Url::parse(&cfg.addr).map_err(|source| ClientError::InvalidUrl {
        addr: cfg.addr.clone(),
        source,
    })?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => return Err(ClientError::UnsupportedScheme(other.to_string())),
    }

    url.query_pairs_mut()
        .append_pair("uid", &cfg.uid)
        .append_pair("tid", &cfg.tid);
    Ok(url)
}

impl Client {
    pub fn new(name: &str, cfg: &WebSocketClientConfig) -> Result<Self, ClientError> {
        let url = build_url(cfg)?;

        // first ping one interval after open, then a fixed cadence
        let mut cron_cfg = CronConfig::default();
        cron_cfg.run_after_start = cfg.ping_interval.clone();
        cron_cfg.interval = cfg.ping_interval.clone();
        cron_cfg.interval_after_finish = false;
        let ping = Cron::new(&format!("{}.PING", name), &cron_cfg)?;

        let (message_sender, message_receiver) = tokio::sync::mpsc::channel(16);
        let (client_close, client_done) = tokio::sync::mpsc::channel(1);

        Ok(Self {
            name: name.to_string(),
            url,
            trace: cfg.trace,
            ping,

            on_open: wrap_fn(|_| async { debug!("Connection opened") }),
            on_message: wrap_fn(|text| async move { debug!("Received message: {}", text) }),
            on_error: wrap_fn(|e| async move { error!("Received error: {}", e) }),
            on_close: wrap_fn(|info| async move { debug!("Connection closed: {:?}", info) }),
            on_pong: wrap_fn(|p| async move { debug!("Received pong: {:?}", p) }),

            client_close: Arc::new(client_close),
            client_done: Arc::new(Mutex::new(client_done)),

            message_sender: Arc::new(message_sender),
            message_receiver: Arc::new(Mutex::new(message_receiver)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target url including the `uid` and `tid` query parameters.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn with_on_open<F, Fut>(mut self, h: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_open = wrap_fn(move |_: ()| h());
        self
    }

    pub fn with_on_message<F, Fut>(mut self, h: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_message = wrap_fn(h);
        self
    }

    pub fn with_on_error<F, Fut>(mut self, h: F) -> Self
    where
        F: Fn(ClientError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_error = wrap_fn(h);
        self
    }

    pub fn with_on_close<F, Fut>(mut self, h: F) -> Self
    where
        F: Fn(CloseInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_close = wrap_fn(h);
        self
    }

    pub fn with_on_pong<F, Fut>(mut self, h: F) -> Self
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_pong = wrap_fn(h);
        self
    }

    /// Routes all five events to one handler.
    pub fn with_handler<H: EventHandler>(self, h: Arc<H>) -> Self {
        let (open, message, err, close, pong) =
            (h.clone(), h.clone(), h.clone(), h.clone(), h);

        self.with_on_open(move || {
            let h = open.clone();
            async move { h.on_open().await }
        })
        .with_on_message(move |text| {
            let h = message.clone();
            async move { h.on_message(text).await }
        })
        .with_on_error(move |e| {
            let h = err.clone();
            async move { h.on_error(e).await }
        })
        .with_on_close(move |info| {
            let h = close.clone();
            async move { h.on_close(info.code, info.reason).await }
        })
        .with_on_pong(move |payload| {
            let h = pong.clone();
            async move { h.on_pong(payload).await }
        })
    }

    /// Asks a running connection to close normally. `run` returns once the
    /// peer has answered.
    pub async fn stop(&self) -> Result<(), SendError<()>> {
        self.client_close.send(()).await
    }

    pub async fn send_message(&self, msg: Message) -> Result<(), SendError<Message>> {
        self.message_sender.send(msg).await
    }

    /// Connects and drives the connection until it ends.
    pub async fn run(&self) {
        let url = self.url.as_str();
        if self.trace {
            debug!(target: WIRE_TARGET, "--- request ---\nGET {}", url);
        }

        let (conn, response) = match connect_async(url).await {
            Ok(conn) => conn,
            Err(source) => {
                error!("[{}] connect to {} failed: {}", self.name, url, source);
                (self.on_error)(ClientError::Connect {
                    url: url.to_string(),
                    source,
                })
                .await;
                return;
            }
        };

        self.dump_response(&response);
        (self.on_open)(()).await;

        let info = self.drive(conn).await;
        debug!("[{}] connection closed: {:?}", self.name, info);
        (self.on_close)(info).await;
    }

    async fn drive(&self, conn: Conn) -> CloseInfo {
        let (mut sink, mut stream) = conn.split();
        let mut ticker = self.ping.ticker();
        let mut done = self.client_done.lock().await;
        let mut outbound = self.message_receiver.lock().await;

        let mut info = CloseInfo::default();
        // set once either side has sent a close frame
        let mut closing = false;

        loop {
            select! {
                _ = ticker.tick(), if !closing => {
                    let now = chrono::Utc::now().timestamp_millis().to_string();
                    if let Err(e) = self.send(&mut sink, Message::Ping(Bytes::from(now))).await {
                        (self.on_error)(e.into()).await;
                        break;
                    }
                }

                Some(_) = done.recv(), if !closing => {
                    closing = true;
                    let frame = CloseFrame {
                        code: CloseCode::Normal,
                        reason: Utf8Bytes::from_static(""),
                    };
                    if let Err(e) = self.send(&mut sink, Message::Close(Some(frame))).await {
                        (self.on_error)(e.into()).await;
                        break;
                    }
                }

                Some(msg) = outbound.recv(), if !closing => {
                    if let Err(e) = self.send(&mut sink, msg).await {
                        (self.on_error)(e.into()).await;
                        break;
                    }
                }

                frame = stream.next() => match frame {
                    Some(Ok(msg)) => {
                        self.dump("recv", &msg);
                        match msg {
                            Message::Text(text) if !closing => {
                                (self.on_message)(text.as_str().to_owned()).await
                            }
                            Message::Binary(data) if !closing => {
                                (self.on_message)(String::from_utf8_lossy(&data).into_owned()).await
                            }
                            Message::Pong(payload) if !closing => (self.on_pong)(payload).await,
                            Message::Close(frame) => {
                                closing = true;
                                if let Some(frame) = frame {
                                    info.code = Some(frame.code.into());
                                    info.reason = Some(frame.reason.as_str().to_owned());
                                }
                            }
                            // pings are answered by tungstenite
                            _ => {}
                        }
                    }

                    Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => break,

                    Some(Err(e)) => {
                        warn!("[{}] read failed: {}", self.name, e);
                        (self.on_error)(e.into()).await;
                        break;
                    }
                },
            }
        }

        info
    }

    async fn send(&self, sink: &mut Sink, msg: Message) -> Result<(), WsError> {
        self.dump("send", &msg);
        sink.send(msg).await
    }

    fn dump(&self, direction: &str, msg: &Message) {
        if self.trace {
            debug!(target: WIRE_TARGET, "{} {:?}", direction, msg);
        }
    }

    fn dump_response(&self, response: &Response) {
        if !self.trace {
            return;
        }

        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v.to_str().unwrap_or("<binary>")))
            .collect::<Vec<_>>()
            .join("\n");
        debug!(
            target: WIRE_TARGET,
            "--- response ---\n{:?} {}\n{}",
            response.version(),
            response.status(),
            headers
        );
    }
}
