// Network probes: local port liveness and ICMP round-trip latency.

use std::process::Stdio;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::time::timeout;

/// True when a TCP connection to 127.0.0.1:`port` is accepted within `limit`.
pub(crate) async fn port_open(port: u16, limit: Duration) -> bool {
    matches!(
        timeout(limit, TcpStream::connect(("127.0.0.1", port))).await,
        Ok(Ok(_))
    )
}

/// One echo request via the system `ping` (no raw-socket privileges needed).
pub(crate) async fn ping_latency_ms(target: &str, limit: Duration) -> Option<u64> {
    let wait_secs = limit.as_secs().max(1).to_string();
    let child = Command::new("ping")
        .args(["-n", "-c", "1", "-W", &wait_secs, target])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    // `ping -W` only bounds the reply wait; the outer timeout also covers DNS and spawn.
    let output = match timeout(limit + Duration::from_millis(500), child).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, operation = "ping", "ping could not be started");
            return None;
        }
        Err(_) => return None,
    };
    if !output.status.success() {
        return None;
    }
    parse_ping_rtt(&String::from_utf8_lossy(&output.stdout)).map(|ms| ms.round() as u64)
}

/// Round trip from a `ping` reply line, e.g. `64 bytes from 1.1.1.1: icmp_seq=1 ttl=57 time=12.4 ms`.
pub(crate) fn parse_ping_rtt(output: &str) -> Option<f64> {
    let start = output.find("time=")? + "time=".len();
    let rest = &output[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}
