//! Format registry and library initialization.
//!
//! Container implementations register themselves under a format-hint name
//! ("rtsp", "mp4", "mem", ...). Registration is explicit: nothing is
//! registered until [`init`] runs or an embedder calls the register
//! functions, and sessions opened before that fail with
//! `OpenError::FormatUnrecognized`.

use crate::memory;
use crate::traits::{Demuxer, Muxer};
use parking_lot::RwLock;
use remux_core::error::OpenError;
use remux_core::Result;
use std::collections::HashMap;
use std::sync::{Arc, Once, OnceLock};
use tracing::debug;

/// Opens a demuxer for a location string.
pub type DemuxerOpener = Arc<dyn Fn(&str) -> Result<Box<dyn Demuxer>> + Send + Sync>;

/// Opens a muxer for a location string.
pub type MuxerOpener = Arc<dyn Fn(&str) -> Result<Box<dyn Muxer>> + Send + Sync>;

/// Registry mapping format-hint names to container implementations.
#[derive(Default)]
pub struct FormatRegistry {
    demuxers: HashMap<String, DemuxerOpener>,
    muxers: HashMap<String, MuxerOpener>,
}

impl FormatRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a demuxer opener under a format name.
    pub fn register_demuxer<F>(&mut self, format: impl Into<String>, opener: F)
    where
        F: Fn(&str) -> Result<Box<dyn Demuxer>> + Send + Sync + 'static,
    {
        let format = format.into();
        debug!(format = %format, "registered demuxer");
        self.demuxers.insert(format, Arc::new(opener));
    }

    /// Register a muxer opener under a format name.
    pub fn register_muxer<F>(&mut self, format: impl Into<String>, opener: F)
    where
        F: Fn(&str) -> Result<Box<dyn Muxer>> + Send + Sync + 'static,
    {
        let format = format.into();
        debug!(format = %format, "registered muxer");
        self.muxers.insert(format, Arc::new(opener));
    }

    /// Check if a demuxer is registered for a format name.
    pub fn has_demuxer(&self, format: &str) -> bool {
        self.demuxers.contains_key(format)
    }

    /// Check if a muxer is registered for a format name.
    pub fn has_muxer(&self, format: &str) -> bool {
        self.muxers.contains_key(format)
    }

    /// Open a source container by format name and location.
    pub fn open_source(&self, format: &str, location: &str) -> Result<Box<dyn Demuxer>> {
        let opener = self
            .demuxers
            .get(format)
            .ok_or_else(|| OpenError::FormatUnrecognized(format.to_string()))?;
        opener(location)
    }

    /// Open a destination container by format name and location.
    pub fn open_sink(&self, format: &str, location: &str) -> Result<Box<dyn Muxer>> {
        let opener = self
            .muxers
            .get(format)
            .ok_or_else(|| OpenError::FormatUnrecognized(format.to_string()))?;
        opener(location)
    }
}

static GLOBAL: OnceLock<RwLock<FormatRegistry>> = OnceLock::new();

fn global() -> &'static RwLock<FormatRegistry> {
    GLOBAL.get_or_init(|| RwLock::new(FormatRegistry::new()))
}

/// One-time library initialization.
///
/// Registers the built-in formats into the global registry. Idempotent;
/// must be called before any session is opened through the global registry.
pub fn init() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        let mut registry = global().write();
        memory::register(&mut registry);
        debug!("format registry initialized");
    });
}

/// Register a demuxer opener into the global registry.
pub fn register_demuxer<F>(format: impl Into<String>, opener: F)
where
    F: Fn(&str) -> Result<Box<dyn Demuxer>> + Send + Sync + 'static,
{
    global().write().register_demuxer(format, opener);
}

/// Register a muxer opener into the global registry.
pub fn register_muxer<F>(format: impl Into<String>, opener: F)
where
    F: Fn(&str) -> Result<Box<dyn Muxer>> + Send + Sync + 'static,
{
    global().write().register_muxer(format, opener);
}

/// Open a source container through the global registry.
pub fn open_source(format: &str, location: &str) -> Result<Box<dyn Demuxer>> {
    global().read().open_source(format, location)
}

/// Open a destination container through the global registry.
pub fn open_sink(format: &str, location: &str) -> Result<Box<dyn Muxer>> {
    global().read().open_sink(format, location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySource;
    use remux_core::error::Error;

    #[test]
    fn test_unknown_format_is_rejected() {
        let registry = FormatRegistry::new();
        let err = registry.open_source("flv", "rtmp://example/live").unwrap_err();
        assert!(matches!(
            err,
            Error::Open(OpenError::FormatUnrecognized(ref f)) if f == "flv"
        ));
    }

    #[test]
    fn test_registered_demuxer_opens() {
        let mut registry = FormatRegistry::new();
        registry.register_demuxer("null", |_location| {
            Ok(Box::new(MemorySource::new(Vec::new(), Vec::new())) as Box<dyn Demuxer>)
        });
        assert!(registry.has_demuxer("null"));
        assert!(registry.open_source("null", "anywhere").is_ok());
    }

    #[test]
    fn test_init_registers_memory_format() {
        init();
        init(); // idempotent
        assert!(global().read().has_demuxer("mem"));
        assert!(global().read().has_muxer("mem"));
    }
}
