//! Scoped hooks a capture driver uses to step time by hand.
//!
//! An [`ExportHost`] is the surface the driver talks to. It does nothing until
//! an [`ExportBridge`] registers a view's export-mode time source on it, and it
//! goes dark again as soon as that bridge is dropped.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::{timeline::SharedTime, GlowGridError, Result, TimeSource};

#[derive(Debug, Clone)]
struct ExportHooks {
    time: SharedTime,
    loop_ms: f64,
    pattern_id: String,
}

/// Driver-facing endpoint. Cloning shares the same registration slot.
#[derive(Debug, Clone, Default)]
pub struct ExportHost {
    slot: Arc<Mutex<Option<ExportHooks>>>,
}

impl ExportHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self) -> Result<bool> {
        Ok(self.lock()?.is_some())
    }

    /// Moves the registered view to absolute time `ms`.
    pub fn set_export_time(&self, ms: f64) -> Result<()> {
        let slot = self.lock()?;
        let hooks = slot.as_ref().ok_or(GlowGridError::BridgeNotRegistered)?;
        hooks.time.set(ms)
    }

    /// Loop length of the registered view's pattern, as-is. Drivers validate it.
    pub fn loop_duration(&self) -> Result<f64> {
        let slot = self.lock()?;
        let hooks = slot.as_ref().ok_or(GlowGridError::BridgeNotRegistered)?;
        Ok(hooks.loop_ms)
    }

    pub fn pattern_id(&self) -> Result<String> {
        let slot = self.lock()?;
        let hooks = slot.as_ref().ok_or(GlowGridError::BridgeNotRegistered)?;
        Ok(hooks.pattern_id.clone())
    }

    /// Whether the registered hooks write to `source`. False when nothing is
    /// registered.
    pub fn drives(&self, source: &TimeSource) -> Result<bool> {
        let slot = self.lock()?;
        Ok(slot
            .as_ref()
            .is_some_and(|hooks| source.publishes_to(&hooks.time)))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<ExportHooks>>> {
        self.slot
            .lock()
            .map_err(|_| GlowGridError::msg("export host has been poisoned"))
    }
}

/// Live registration of a time source on an [`ExportHost`]. Dropping it
/// removes the hooks again.
#[derive(Debug)]
pub struct ExportBridge {
    host: ExportHost,
}

impl ExportBridge {
    /// Registers `source` on `host`. The source must be in export mode and
    /// the host must be free.
    pub fn register(
        host: &ExportHost,
        source: &TimeSource,
        loop_ms: f64,
        pattern_id: &str,
    ) -> Result<Self> {
        let time = source.export_handle()?;
        let mut slot = host.lock()?;
        if slot.is_some() {
            return Err(GlowGridError::BridgeAlreadyRegistered);
        }

        *slot = Some(ExportHooks {
            time,
            loop_ms,
            pattern_id: pattern_id.to_string(),
        });
        tracing::debug!(pattern = pattern_id, loop_ms, "export bridge registered");

        Ok(Self { host: host.clone() })
    }

    pub fn host(&self) -> &ExportHost {
        &self.host
    }

    /// Explicit form of dropping the bridge.
    pub fn unregister(self) {}
}

impl Drop for ExportBridge {
    fn drop(&mut self) {
        match self.host.slot.lock() {
            Ok(mut slot) => {
                *slot = None;
                tracing::debug!("export bridge removed");
            }
            Err(poisoned) => {
                *poisoned.into_inner() = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimeMode;

    #[test]
    fn unregistered_host_rejects_calls() {
        let host = ExportHost::new();
        assert!(!host.is_registered().unwrap());
        assert!(matches!(
            host.set_export_time(10.0),
            Err(GlowGridError::BridgeNotRegistered)
        ));
        assert!(matches!(
            host.loop_duration(),
            Err(GlowGridError::BridgeNotRegistered)
        ));
    }

    #[test]
    fn registered_host_drives_the_source() {
        let host = ExportHost::new();
        let source = TimeSource::new(TimeMode::Export);
        let bridge = ExportBridge::register(&host, &source, 1600.0, "wave").unwrap();

        host.set_export_time(400.0).unwrap();
        assert_eq!(source.now_ms().unwrap(), 400.0);
        assert_eq!(host.loop_duration().unwrap(), 1600.0);
        assert_eq!(host.pattern_id().unwrap(), "wave");

        bridge.unregister();
        assert!(!host.is_registered().unwrap());
        assert!(host.set_export_time(800.0).is_err());
        assert_eq!(source.now_ms().unwrap(), 400.0);
    }

    #[test]
    fn realtime_sources_cannot_register() {
        let host = ExportHost::new();
        let source = TimeSource::new(TimeMode::Realtime);
        assert!(ExportBridge::register(&host, &source, 1000.0, "spiral").is_err());
        assert!(!host.is_registered().unwrap());
    }

    #[test]
    fn one_bridge_per_host_but_hosts_are_independent() {
        let host_a = ExportHost::new();
        let host_b = ExportHost::new();
        let source_a = TimeSource::new(TimeMode::Export);
        let source_b = TimeSource::new(TimeMode::Export);

        let _a = ExportBridge::register(&host_a, &source_a, 1000.0, "a").unwrap();
        assert!(matches!(
            ExportBridge::register(&host_a, &source_b, 1000.0, "b"),
            Err(GlowGridError::BridgeAlreadyRegistered)
        ));
        let _b = ExportBridge::register(&host_b, &source_b, 2000.0, "b").unwrap();

        host_a.set_export_time(5.0).unwrap();
        host_b.set_export_time(7.0).unwrap();
        assert_eq!(source_a.now_ms().unwrap(), 5.0);
        assert_eq!(source_b.now_ms().unwrap(), 7.0);

        assert!(host_a.drives(&source_a).unwrap());
        assert!(!host_a.drives(&source_b).unwrap());
        assert!(!ExportHost::new().drives(&source_a).unwrap());
    }

    #[test]
    fn failed_registration_keeps_existing_hooks() {
        let host = ExportHost::new();
        let source = TimeSource::new(TimeMode::Export);
        let _bridge = ExportBridge::register(&host, &source, 1000.0, "first").unwrap();
        let other = TimeSource::new(TimeMode::Export);
        let _ = ExportBridge::register(&host, &other, 2000.0, "second");
        assert_eq!(host.pattern_id().unwrap(), "first");
    }
}
