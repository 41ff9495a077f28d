//! Remux engine: orchestrates one source-to-destination copy run.

use crate::error::{EngineError, Result};
use crate::sink::DestinationSession;
use crate::source::{ReadOutcome, SourceSession};
use serde::Serialize;
use tracing::{debug, info};

/// Engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineState {
    /// Nothing opened yet.
    Idle,
    /// The source session is open.
    SourceOpen,
    /// Both sessions are open.
    BothOpen,
    /// Packets are being pumped.
    Pumping,
    /// A fatal error occurred; teardown is pending or in progress.
    Failed,
    /// Both sessions are released. Terminal.
    Closed,
}

/// Configuration for a remux run.
#[derive(Debug, Clone)]
pub struct RemuxConfig {
    /// Source format hint (e.g. "rtsp").
    pub source_format: String,
    /// Source location (e.g. an rtsp:// URL).
    pub source_location: String,
    /// Destination format hint (e.g. "mp4").
    pub destination_format: String,
    /// Destination location (e.g. a file: reference).
    pub destination_location: String,
    /// Stop after this many committed units. `None` runs until the source
    /// is exhausted.
    pub frame_budget: Option<u64>,
}

impl RemuxConfig {
    /// Create a configuration with an unbounded frame budget.
    pub fn new(
        source_format: impl Into<String>,
        source_location: impl Into<String>,
        destination_format: impl Into<String>,
        destination_location: impl Into<String>,
    ) -> Self {
        Self {
            source_format: source_format.into(),
            source_location: source_location.into(),
            destination_format: destination_format.into(),
            destination_location: destination_location.into(),
            frame_budget: None,
        }
    }

    /// Bound the run to at most `budget` committed units. Zero means
    /// unbounded.
    pub fn frame_budget(mut self, budget: u64) -> Self {
        self.frame_budget = (budget > 0).then_some(budget);
        self
    }
}

/// Result of a completed remux run.
#[derive(Debug, Clone, Serialize)]
pub struct RemuxSummary {
    /// Units committed to the destination.
    pub units_committed: u64,
    /// Payload bytes copied.
    pub bytes_copied: u64,
    /// Decode timestamp of the last committed unit, in destination time
    /// base ticks.
    pub last_dts: Option<i64>,
}

/// Drives one copy run: open source, open destination, pump, close both.
///
/// Every collaborator error is fatal to the run and surfaced with the phase
/// that produced it; the engine never retries. Teardown always closes the
/// destination first (so its trailer is written) and then the source,
/// whichever way the run ended.
pub struct RemuxEngine {
    config: RemuxConfig,
    state: EngineState,
    units_committed: u64,
    bytes_copied: u64,
}

impl RemuxEngine {
    /// Create an engine for the given configuration.
    pub fn new(config: RemuxConfig) -> Self {
        Self {
            config,
            state: EngineState::Idle,
            units_committed: 0,
            bytes_copied: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Run the copy to completion.
    pub fn run(&mut self) -> Result<RemuxSummary> {
        debug!(
            format = %self.config.source_format,
            location = %self.config.source_location,
            "opening source"
        );
        let mut source =
            match SourceSession::open(&self.config.source_format, &self.config.source_location) {
                Ok(source) => source,
                Err(e) => {
                    self.state = EngineState::Closed;
                    return Err(EngineError::OpenSource(e));
                }
            };
        self.state = EngineState::SourceOpen;

        debug!(
            format = %self.config.destination_format,
            location = %self.config.destination_location,
            "opening destination"
        );
        let mut dest = match DestinationSession::open(
            &self.config.destination_format,
            &self.config.destination_location,
            source.selected_stream(),
        ) {
            Ok(dest) => dest,
            Err(e) => {
                self.state = EngineState::Failed;
                source.close();
                self.state = EngineState::Closed;
                return Err(EngineError::OpenDestination(e));
            }
        };
        self.state = EngineState::BothOpen;

        self.state = EngineState::Pumping;
        let result = self.pump(&mut source, &mut dest);
        if result.is_err() {
            self.state = EngineState::Failed;
        }

        let last_dts = dest.last_dts();
        dest.close();
        source.close();
        self.state = EngineState::Closed;

        result?;

        let summary = RemuxSummary {
            units_committed: self.units_committed,
            bytes_copied: self.bytes_copied,
            last_dts: last_dts.is_valid().then_some(last_dts.value),
        };
        info!(
            units = summary.units_committed,
            bytes = summary.bytes_copied,
            "remux run complete"
        );
        Ok(summary)
    }

    fn pump(&mut self, source: &mut SourceSession, dest: &mut DestinationSession) -> Result<()> {
        loop {
            if let Some(budget) = self.config.frame_budget {
                if self.units_committed >= budget {
                    debug!(units = self.units_committed, "frame budget reached");
                    return Ok(());
                }
            }

            match source.read_unit() {
                Ok(ReadOutcome::Skipped) => continue,
                Ok(ReadOutcome::Unit(packet)) => {
                    let size = dest
                        .commit_unit(packet, source.selected_stream())
                        .map_err(EngineError::Write)?;
                    self.units_committed += 1;
                    self.bytes_copied += size as u64;
                }
                // For an unbounded run, exhausting the source is the normal
                // way to finish.
                Err(e) if e.is_eof() && self.config.frame_budget.is_none() => {
                    debug!(units = self.units_committed, "source exhausted");
                    return Ok(());
                }
                Err(e) => return Err(EngineError::Read(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_budget_means_unbounded() {
        let config = RemuxConfig::new("rtsp", "rtsp://cam/live", "mp4", "file:/tmp/out.mp4")
            .frame_budget(0);
        assert_eq!(config.frame_budget, None);

        let config = config.frame_budget(100);
        assert_eq!(config.frame_budget, Some(100));
    }

    #[test]
    fn test_new_engine_is_idle() {
        let engine = RemuxEngine::new(RemuxConfig::new("rtsp", "u", "mp4", "f"));
        assert_eq!(engine.state(), EngineState::Idle);
    }
}
