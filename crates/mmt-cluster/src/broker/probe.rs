use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{Ipv4Addr, Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use camino::Utf8Path;
use tracing::debug;

use super::BROKER_TARGET;

/// Line the broker logs once it accepts connections.
pub const BROKER_READY_MARKER: &str = "INFO [Kafka Server 0], started (kafka.server.KafkaServer)";

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Sends `ruok` to the coordination service on localhost and expects `imok`.
///
/// Any connection or I/O failure counts as unhealthy.
#[must_use]
pub fn probe_coordination(port: u16) -> bool {
    match exchange_ruok(port) {
        Ok(reply) => reply == "imok",
        Err(error) => {
            debug!(target: BROKER_TARGET, port, %error, "coordination probe failed");
            false
        }
    }
}

fn exchange_ruok(port: u16) -> io::Result<String> {
    let address = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let mut stream = TcpStream::connect_timeout(&address, PROBE_TIMEOUT)?;
    stream.set_read_timeout(Some(PROBE_TIMEOUT))?;
    stream.set_write_timeout(Some(PROBE_TIMEOUT))?;
    stream.write_all(b"ruok")?;
    stream.shutdown(Shutdown::Write)?;
    let mut reply = String::new();
    stream.read_to_string(&mut reply)?;
    Ok(reply.trim().to_owned())
}

/// Reports whether any line of the log at `path` contains `marker`.
///
/// A log that does not exist yet contains nothing. Lines are decoded lossily
/// so stray non-UTF-8 output never hides the marker.
pub fn log_contains_marker(path: &Utf8Path, marker: &str) -> io::Result<bool> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(error) => return Err(error),
    };
    let mut reader = BufReader::new(file);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(false);
        }
        if String::from_utf8_lossy(&line).contains(marker) {
            return Ok(true);
        }
    }
}
