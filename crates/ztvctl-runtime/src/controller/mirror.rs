//! Local copy of the worker's confirmed topology.

use std::collections::BTreeMap;

use ztvctl_core::{Channel, LogLevel, SavedState, Tunnel};

/// Topology confirmed by the worker identified by `generation`.
///
/// `generation` is zero while no worker owns the mirror. Updates carrying a
/// different generation come from a superseded worker and are discarded.
#[derive(Debug, Default)]
pub(crate) struct Mirror {
    pub generation: u64,
    pub channels: BTreeMap<u32, Channel>,
    pub tunnels: BTreeMap<u32, Tunnel>,
    pub logging_level: LogLevel,
}

impl Mirror {
    /// Hand the mirror to a new worker, starting from an empty topology.
    pub fn adopt(&mut self, generation: u64) {
        self.clear_topology();
        self.generation = generation;
    }

    /// Detach the mirror from its worker. The logging level is kept so it
    /// can be reapplied by whoever restores state.
    pub fn release(&mut self) {
        self.clear_topology();
        self.generation = 0;
    }

    fn clear_topology(&mut self) {
        self.channels.clear();
        self.tunnels.clear();
    }

    pub fn export(&self) -> SavedState {
        SavedState {
            channels: self.channels.values().cloned().collect(),
            tunnels: self.tunnels.values().cloned().collect(),
            logging_level: Some(self.logging_level),
        }
    }
}
