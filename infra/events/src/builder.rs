use crate::bus::EventBus;
use crate::config::{BusConfig, FaultPolicy};

/// Builder for an [`EventBus`].
#[derive(Debug, Default)]
pub struct EventBusBuilder {
    config: BusConfig,
}

impl EventBusBuilder {
    /// Sets how listener faults are handled during dispatch.
    #[must_use = "Sets the fault policy of the event bus"]
    pub const fn fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.config.fault_policy = policy;
        self
    }

    /// Replaces every setting with a loaded [`BusConfig`].
    #[must_use = "Sets the configuration of the event bus"]
    pub const fn config(mut self, config: BusConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "Builds the event bus"]
    pub fn build(self) -> EventBus {
        EventBus::with_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let bus = EventBus::builder().build();
        assert_eq!(*bus.config(), BusConfig::default());
    }

    #[test]
    fn test_builder_last_setting_wins() {
        let bus = EventBus::builder()
            .config(BusConfig { fault_policy: FaultPolicy::Continue })
            .fault_policy(FaultPolicy::Abort)
            .build();
        assert_eq!(bus.fault_policy(), FaultPolicy::Abort);

        let bus = EventBus::builder()
            .fault_policy(FaultPolicy::Abort)
            .config(BusConfig { fault_policy: FaultPolicy::Continue })
            .build();
        assert_eq!(bus.fault_policy(), FaultPolicy::Continue);
    }
}
