//! Loopback responder for the coordination service's `ruok` probe.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};

/// Answers every `ruok` with `imok` until dropped.
pub(crate) struct CoordinationStub {
    port: u16,
    stopping: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CoordinationStub {
    pub(crate) fn start() -> Result<Self> {
        let listener =
            TcpListener::bind(("127.0.0.1", 0)).context("bind coordination stub")?;
        let port = listener
            .local_addr()
            .context("read coordination stub address")?
            .port();
        let stopping = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopping);
        let handle = thread::spawn(move || {
            for stream in listener.incoming() {
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                if let Ok(mut stream) = stream {
                    let mut request = [0_u8; 4];
                    if stream.read_exact(&mut request).is_ok() && &request == b"ruok" {
                        let _ = stream.write_all(b"imok");
                    }
                }
            }
        });
        Ok(Self {
            port,
            stopping,
            handle: Some(handle),
        })
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for CoordinationStub {
    fn drop(&mut self) {
        self.stopping.store(true, Ordering::SeqCst);
        let _ = TcpStream::connect(("127.0.0.1", self.port));
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
