//! Interactive logging console.
//!
//! Each input line is one button press. Incident buttons run their capture
//! in a background task, so a slow location lookup never blocks the next
//! press; results come back over a channel and are reported as they land.
//!
//! Starting a trip, exporting and quitting first wait for captures still in
//! flight, so every press is recorded in the trip it was made in.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::capture::{CaptureReport, EventCapture};
use crate::error::{Error, Result};
use crate::event::IncidentKind;
use crate::export::{ExportFormat, Exporter};
use crate::session::{Session, SharedSession};

/// Capacity of the capture result channel.
const RESULT_CHANNEL_CAPACITY: usize = 32;

/// One parsed line of console input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Start a new trip.
    StartTrip,
    /// Record an incident.
    Capture(IncidentKind),
    /// Write the export file, optionally overriding the layout.
    Export(Option<ExportFormat>),
    /// Show trip and event counts.
    Status,
    /// List incident buttons.
    Kinds,
    /// Show the command list.
    Help,
    /// Leave the console.
    Quit,
}

impl std::str::FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(head) = words.next() else {
            return Err("empty command".to_string());
        };
        let arg = words.next();
        if words.next().is_some() {
            return Err(format!("too many arguments: {s}"));
        }

        let command = match (head.to_ascii_lowercase().as_str(), arg) {
            ("s" | "start", None) => Self::StartTrip,
            ("e" | "export", None) => Self::Export(None),
            ("e" | "export", Some(format)) => Self::Export(Some(format.parse()?)),
            ("status", None) => Self::Status,
            ("k" | "kinds", None) => Self::Kinds,
            ("h" | "help" | "?", None) => Self::Help,
            ("q" | "quit" | "exit", None) => Self::Quit,
            (word, None) => match word.parse::<usize>() {
                Ok(button) => IncidentKind::from_button(button)
                    .map(Self::Capture)
                    .ok_or_else(|| format!("no button {button}"))?,
                Err(_) => Self::Capture(word.parse()?),
            },
            (_, Some(_)) => return Err(format!("unexpected argument in: {s}")),
        };
        Ok(command)
    }
}

/// Counts reported when the console exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Trips started.
    pub trips: usize,
    /// Events recorded.
    pub events: usize,
    /// Exports written.
    pub exports: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

type CaptureResult = (IncidentKind, Result<CaptureReport>);

/// The interactive console.
#[derive(Debug)]
pub struct Console<W: Write> {
    session: SharedSession,
    capture: EventCapture,
    exporter: Exporter,
    default_format: ExportFormat,
    out: W,
    results_tx: mpsc::Sender<CaptureResult>,
    results_rx: mpsc::Receiver<CaptureResult>,
    in_flight: usize,
    exports: usize,
}

impl<W: Write> Console<W> {
    /// Create a console over a fresh session.
    #[must_use]
    pub fn new(
        capture: EventCapture,
        exporter: Exporter,
        default_format: ExportFormat,
        out: W,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        Self {
            session: Session::new().shared(),
            capture,
            exporter,
            default_format,
            out,
            results_tx,
            results_rx,
            in_flight: 0,
            exports: 0,
        }
    }

    /// The session this console is logging into.
    #[must_use]
    pub fn session(&self) -> SharedSession {
        SharedSession::clone(&self.session)
    }

    /// Read commands from `input` until `quit` or end of input.
    ///
    /// Captures still in flight at exit are waited for (each is bounded by
    /// the location timeout) before the summary is taken.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading input or writing output fails.
    /// Alerts and failed exports are printed and the console keeps going.
    pub async fn run<R>(&mut self, input: R) -> Result<SessionSummary>
    where
        R: AsyncBufRead + Unpin,
    {
        self.print_menu()?;
        let mut lines = input.lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if self.handle_line(&line).await? == Flow::Quit {
                        break;
                    }
                }
                Some(result) = self.results_rx.recv() => self.report(result)?,
            }
        }

        self.settle().await?;
        let session = self.session.lock().await;
        Ok(SessionSummary {
            trips: session.trip_count(),
            events: session.event_count(),
            exports: self.exports,
        })
    }

    async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(message) => {
                writeln!(self.out, "? {message} (type 'help' for commands)")?;
                return Ok(Flow::Continue);
            }
        };
        debug!(?command, "Console command");

        match command {
            ConsoleCommand::StartTrip => {
                // Presses made during the previous trip land there first.
                self.settle().await?;
                let trip = self.session.lock().await.start_trip();
                writeln!(self.out, "Trip {trip} started.")?;
            }
            ConsoleCommand::Capture(kind) => self.press(kind).await?,
            ConsoleCommand::Export(format) => {
                self.export(format.unwrap_or(self.default_format)).await?;
            }
            ConsoleCommand::Status => self.print_status().await?,
            ConsoleCommand::Kinds => self.print_kinds()?,
            ConsoleCommand::Help => self.print_menu()?,
            ConsoleCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Handle an incident button: reject at once without a trip, otherwise
    /// hand the capture to a background task.
    async fn press(&mut self, kind: IncidentKind) -> Result<()> {
        if self.session.lock().await.active_trip().is_none() {
            return self.alert(&Error::NoActiveTrip);
        }

        let capture = self.capture.clone();
        let session = SharedSession::clone(&self.session);
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let result = capture.capture(&session, kind).await;
            // The receiver lives as long as the console; a send error means
            // the console is gone and nobody is left to report to.
            let _ = tx.send((kind, result)).await;
        });
        self.in_flight += 1;
        writeln!(self.out, "{} ... locating", kind.label())?;
        Ok(())
    }

    /// Export after all earlier presses have landed.
    async fn export(&mut self, format: ExportFormat) -> Result<()> {
        self.settle().await?;
        let result = {
            let session = self.session.lock().await;
            self.exporter.export(&session, format)
        };
        match result {
            Ok(report) => {
                self.exports += 1;
                writeln!(
                    self.out,
                    "Exported {} trip(s), {} event(s) to {}",
                    report.trips,
                    report.events,
                    report.path.display()
                )?;
            }
            Err(err) if err.is_user_alert() => self.alert(&err)?,
            Err(err) => writeln!(self.out, "! Export failed: {err}")?,
        }
        Ok(())
    }

    /// Wait for every capture still in flight.
    async fn settle(&mut self) -> Result<()> {
        while self.in_flight > 0 {
            match self.results_rx.recv().await {
                Some(result) => self.report(result)?,
                None => break,
            }
        }
        Ok(())
    }

    fn report(&mut self, (kind, result): CaptureResult) -> Result<()> {
        self.in_flight = self.in_flight.saturating_sub(1);
        match result {
            Ok(report) => match report.event.location() {
                Some(coords) => writeln!(
                    self.out,
                    "Recorded {} in trip {} at {} ({coords})",
                    kind.label(),
                    report.trip,
                    report.event.timestamp()
                )?,
                None => writeln!(
                    self.out,
                    "Recorded {} in trip {} at {} (no location)",
                    kind.label(),
                    report.trip,
                    report.event.timestamp()
                )?,
            },
            Err(err) => self.alert(&err)?,
        }
        Ok(())
    }

    fn alert(&mut self, err: &Error) -> Result<()> {
        let message = match err {
            Error::NoActiveTrip => "No active trip. Start a trip first.".to_string(),
            Error::NothingToExport { what } => format!("No {what} recorded yet."),
            Error::TripNotActive { trip, active } => {
                format!("Event for trip {trip} dropped: trip {active} started meanwhile.")
            }
            other => other.to_string(),
        };
        writeln!(self.out, "! {message}")?;
        Ok(())
    }

    async fn print_status(&mut self) -> Result<()> {
        let (active, trips, events) = {
            let session = self.session.lock().await;
            (
                session.active_trip(),
                session.trip_count(),
                session.event_count(),
            )
        };
        match active {
            Some(trip) => writeln!(self.out, "Trip {trip} active.")?,
            None => writeln!(self.out, "No active trip.")?,
        }
        writeln!(
            self.out,
            "{trips} trip(s), {events} event(s), {} capture(s) pending.",
            self.in_flight
        )?;
        writeln!(self.out, "Exports go to {}", self.exporter.directory().display())?;
        Ok(())
    }

    fn print_kinds(&mut self) -> Result<()> {
        for kind in IncidentKind::ALL {
            writeln!(self.out, "  [{}] {:<18} {}", kind.button(), kind.label(), kind)?;
        }
        Ok(())
    }

    fn print_menu(&mut self) -> Result<()> {
        writeln!(self.out, "Manual event log")?;
        writeln!(self.out, "  [s] Start trip")?;
        self.print_kinds()?;
        writeln!(self.out, "  [e] Export report ([e trips] or [e events])")?;
        writeln!(self.out, "  [status] [help] [q] Quit")?;
        Ok(())
    }
}
