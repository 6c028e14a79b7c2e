//! Position queries against a gpsd daemon.
//!
//! Speaks the gpsd JSON protocol over TCP: enable watch mode, then read
//! reports until a `TPV` report carries a usable fix.

use std::io::ErrorKind;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use super::{LocationOutcome, LocationProvider, LocationRequest};
use crate::event::Coordinates;

/// Default address of a local gpsd.
pub const DEFAULT_GPSD_ADDRESS: &str = "127.0.0.1:2947";

const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";

// gpsd fix modes: 0/1 = no fix, 2 = 2D, 3 = 3D.
const MODE_2D: u8 = 2;
const MODE_3D: u8 = 3;

#[derive(Debug, Deserialize)]
struct Report {
    class: String,
    #[serde(default)]
    mode: u8,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Extract a fix from one line of gpsd output.
///
/// High-accuracy requests only accept 3D fixes.
fn fix_from_report(line: &str, high_accuracy: bool) -> Option<Coordinates> {
    let report: Report = serde_json::from_str(line).ok()?;
    if report.class != "TPV" {
        return None;
    }
    let required = if high_accuracy { MODE_3D } else { MODE_2D };
    if report.mode < required {
        return None;
    }
    Some(Coordinates::new(report.lat?, report.lon?))
}

/// Map the result of a gpsd session to a location outcome.
fn outcome_from_query(
    address: &str,
    result: std::io::Result<Option<Coordinates>>,
) -> LocationOutcome {
    match result {
        Ok(Some(coords)) => LocationOutcome::Resolved(coords),
        Ok(None) => {
            LocationOutcome::Unavailable("gpsd closed the connection without a fix".to_string())
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            LocationOutcome::Denied(format!("gpsd at {address}: {e}"))
        }
        Err(e) => LocationOutcome::Unavailable(format!("gpsd at {address}: {e}")),
    }
}

/// Provider backed by a gpsd daemon.
#[derive(Debug, Clone)]
pub struct GpsdProvider {
    address: String,
}

impl GpsdProvider {
    /// Create a provider talking to gpsd at `address` (`host:port`).
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    async fn query(&self, high_accuracy: bool) -> std::io::Result<Option<Coordinates>> {
        let mut stream = TcpStream::connect(&self.address).await?;
        debug!(address = %self.address, "Connected to gpsd");
        stream.write_all(WATCH_COMMAND).await?;

        let mut lines = BufReader::new(stream).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(coords) = fix_from_report(&line, high_accuracy) {
                return Ok(Some(coords));
            }
            trace!(line = %line, "Skipping gpsd report");
        }
        Ok(None)
    }
}

impl Default for GpsdProvider {
    fn default() -> Self {
        Self::new(DEFAULT_GPSD_ADDRESS)
    }
}

#[async_trait::async_trait]
impl LocationProvider for GpsdProvider {
    fn name(&self) -> &'static str {
        "gpsd"
    }

    async fn current_position(&self, request: &LocationRequest) -> LocationOutcome {
        outcome_from_query(&self.address, self.query(request.high_accuracy).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    const VERSION: &str = r#"{"class":"VERSION","release":"3.25","rev":"3.25","proto_major":3,"proto_minor":15}"#;
    const TPV_NO_FIX: &str = r#"{"class":"TPV","device":"/dev/ttyACM0","mode":1}"#;
    const TPV_2D: &str = r#"{"class":"TPV","device":"/dev/ttyACM0","mode":2,"lat":-23.5,"lon":-46.6}"#;
    const TPV_3D: &str = r#"{"class":"TPV","device":"/dev/ttyACM0","mode":3,"lat":-23.5,"lon":-46.6,"alt":760.0}"#;

    /// Serve `lines` to the first client, then close the connection.
    async fn serve(lines: &'static [&'static str]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let _ = socket.read(&mut buf).await;
            for line in lines {
                socket.write_all(line.as_bytes()).await.unwrap();
                socket.write_all(b"\n").await.unwrap();
            }
        });
        addr
    }

    #[test]
    fn test_fix_from_report_ignores_other_classes() {
        assert_eq!(fix_from_report(VERSION, false), None);
    }

    #[test]
    fn test_fix_from_report_requires_fix() {
        assert_eq!(fix_from_report(TPV_NO_FIX, false), None);
    }

    #[test]
    fn test_fix_from_report_2d() {
        assert_eq!(
            fix_from_report(TPV_2D, false),
            Some(Coordinates::new(-23.5, -46.6))
        );
        assert_eq!(fix_from_report(TPV_2D, true), None);
    }

    #[test]
    fn test_fix_from_report_3d() {
        assert_eq!(
            fix_from_report(TPV_3D, true),
            Some(Coordinates::new(-23.5, -46.6))
        );
    }

    #[test]
    fn test_fix_from_report_garbage() {
        assert_eq!(fix_from_report("not json", false), None);
        assert_eq!(fix_from_report(r#"{"class":"TPV","mode":3}"#, true), None);
    }

    #[tokio::test]
    async fn test_query_reads_until_fix() {
        let addr = serve(&[VERSION, TPV_NO_FIX, TPV_2D, TPV_3D]).await;
        let provider = GpsdProvider::new(addr);
        let outcome = provider.current_position(&LocationRequest::default()).await;
        assert_eq!(outcome, LocationOutcome::Resolved(Coordinates::new(-23.5, -46.6)));
    }

    #[tokio::test]
    async fn test_query_without_fix_is_unavailable() {
        let addr = serve(&[VERSION, TPV_NO_FIX]).await;
        let provider = GpsdProvider::new(addr);
        let outcome = provider.current_position(&LocationRequest::default()).await;
        assert!(matches!(outcome, LocationOutcome::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let provider = GpsdProvider::new(addr.clone());
        let outcome = provider.current_position(&LocationRequest::default()).await;
        match outcome {
            LocationOutcome::Unavailable(reason) => assert!(reason.contains(&addr)),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_permission_denied_is_denied() {
        let err = std::io::Error::new(ErrorKind::PermissionDenied, "blocked by policy");
        match outcome_from_query(DEFAULT_GPSD_ADDRESS, Err(err)) {
            LocationOutcome::Denied(reason) => {
                assert!(reason.contains(DEFAULT_GPSD_ADDRESS));
                assert!(reason.contains("blocked by policy"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_other_io_errors_are_unavailable() {
        let err = std::io::Error::new(ErrorKind::ConnectionReset, "reset");
        assert!(matches!(
            outcome_from_query(DEFAULT_GPSD_ADDRESS, Err(err)),
            LocationOutcome::Unavailable(_)
        ));
    }

    #[test]
    fn test_default_address() {
        assert_eq!(GpsdProvider::default().address, DEFAULT_GPSD_ADDRESS);
    }
}
