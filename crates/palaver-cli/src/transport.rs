use std::path::PathBuf;
use std::time::Duration;

use palaver_core::events::{ClientCommand, ServerEvent};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const RECONNECT_DELAY_SECS: u64 = 2;

/// Connection lifecycle and inbound traffic, as seen by the app loop.
#[derive(Debug)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    Event(ServerEvent),
}

/// Client for the chat server's line-delimited JSON socket.
///
/// This is the only place in the client where true asynchrony lives: the
/// engine itself is synchronous and single-writer, fed one event at a time
/// from this adapter.
pub struct SocketClient {
    socket_path: PathBuf,
}

impl SocketClient {
    pub fn new() -> Self {
        Self {
            socket_path: Self::default_socket_path(),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { socket_path: path }
    }

    pub fn default_socket_path() -> PathBuf {
        if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
            PathBuf::from(runtime_dir).join("palaver.sock")
        } else {
            PathBuf::from("/tmp/palaver.sock")
        }
    }

    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }

    async fn connect(&self) -> Option<UnixStream> {
        match UnixStream::connect(&self.socket_path).await {
            Ok(stream) => {
                info!("Connected to chat server at {:?}", self.socket_path);
                Some(stream)
            }
            Err(e) => {
                debug!("Failed to connect to {:?}: {}", self.socket_path, e);
                None
            }
        }
    }

    /// Run the transport: forward inbound events, write queued outbound
    /// commands, reconnect with a fixed delay when the connection drops.
    /// Commands produced while disconnected are dropped (delivery across
    /// reconnects is not guaranteed); the app resyncs on `Connected` instead.
    pub async fn run(
        self,
        event_tx: mpsc::Sender<TransportEvent>,
        mut command_rx: mpsc::Receiver<ClientCommand>,
    ) {
        loop {
            if let Some(stream) = self.connect().await {
                if event_tx.send(TransportEvent::Connected).await.is_err() {
                    return;
                }
                if let Err(e) = Self::drive_connection(stream, &event_tx, &mut command_rx).await {
                    warn!("Connection error: {}", e);
                }
                info!("Chat server disconnected");
                if event_tx.send(TransportEvent::Disconnected).await.is_err() {
                    return;
                }
            }

            // Wait before reconnect attempt
            tokio::time::sleep(Duration::from_secs(RECONNECT_DELAY_SECS)).await;
        }
    }

    async fn drive_connection(
        stream: UnixStream,
        event_tx: &mpsc::Sender<TransportEvent>,
        command_rx: &mut mpsc::Receiver<ClientCommand>,
    ) -> std::io::Result<()> {
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) if line.is_empty() => continue,
                        Some(line) => match serde_json::from_str::<ServerEvent>(&line) {
                            Ok(event) => {
                                if event_tx.send(TransportEvent::Event(event)).await.is_err() {
                                    return Ok(());
                                }
                            }
                            Err(e) => {
                                warn!("Failed to parse event: {} - line: {}", e, line);
                            }
                        },
                        None => return Ok(()),
                    }
                }
                command = command_rx.recv() => {
                    let Some(command) = command else {
                        // App side dropped the queue; shut down cleanly.
                        return Ok(());
                    };
                    let mut payload = serde_json::to_string(&command)
                        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                    payload.push('\n');
                    write_half.write_all(payload.as_bytes()).await?;
                }
            }
        }
    }
}

impl Default for SocketClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UnixListener;

    #[tokio::test]
    async fn test_events_and_commands_cross_the_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palaver-test.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let (event_tx, mut event_rx) = mpsc::channel(16);
        let (command_tx, command_rx) = mpsc::channel(16);
        let client_task = tokio::spawn(SocketClient::with_path(path).run(event_tx, command_rx));

        let (server_stream, _) = listener.accept().await.unwrap();
        let (server_read, mut server_write) = server_stream.into_split();

        assert!(matches!(
            event_rx.recv().await,
            Some(TransportEvent::Connected)
        ));

        server_write
            .write_all(b"{\"type\":\"directory_snapshot\",\"chats\":[]}\n")
            .await
            .unwrap();
        match event_rx.recv().await {
            Some(TransportEvent::Event(ServerEvent::DirectorySnapshot { chats })) => {
                assert!(chats.is_empty())
            }
            other => panic!("unexpected transport event: {other:?}"),
        }

        command_tx
            .send(ClientCommand::RequestDirectory)
            .await
            .unwrap();
        let mut server_lines = BufReader::new(server_read).lines();
        let line = server_lines.next_line().await.unwrap().unwrap();
        assert_eq!(
            serde_json::from_str::<ClientCommand>(&line).unwrap(),
            ClientCommand::RequestDirectory
        );

        client_task.abort();
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("palaver-test.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let (event_tx, mut event_rx) = mpsc::channel(16);
        let (_command_tx, command_rx) = mpsc::channel(16);
        let client_task = tokio::spawn(SocketClient::with_path(path).run(event_tx, command_rx));

        let (server_stream, _) = listener.accept().await.unwrap();
        let (_server_read, mut server_write) = server_stream.into_split();

        assert!(matches!(
            event_rx.recv().await,
            Some(TransportEvent::Connected)
        ));

        server_write.write_all(b"not json\n").await.unwrap();
        server_write
            .write_all(b"{\"type\":\"server_error\",\"reason\":\"boom\"}\n")
            .await
            .unwrap();

        // The garbage line is logged and skipped; the next event arrives.
        match event_rx.recv().await {
            Some(TransportEvent::Event(ServerEvent::ServerError { reason })) => {
                assert_eq!(reason, "boom")
            }
            other => panic!("unexpected transport event: {other:?}"),
        }

        client_task.abort();
    }
}
