//! Container owning the latest network snapshot
//!
//! Readers take the latest snapshot and keep it for as long as they need it.
//! A single writer at a time works on a [`RouterDbMutator`]; committing or
//! dropping it publishes the new snapshot.

use butterfly_common::{Error, Result};
use parking_lot::RwLock;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::RoutingConfig;
use crate::network::{NetworkMutator, RoutingNetwork};
use crate::type_index::GroupingFunction;

pub struct RouterDb {
    latest: RwLock<Arc<RoutingNetwork>>,
    writer_open: AtomicBool,
    config: RoutingConfig,
}

impl RouterDb {
    /// Empty database at the configured zoom level.
    pub fn new(config: RoutingConfig) -> Result<Self> {
        config.validate()?;
        let network = RoutingNetwork::new(config.zoom)?;
        Ok(Self::from_network(network, config))
    }

    pub fn from_network(network: RoutingNetwork, config: RoutingConfig) -> Self {
        Self {
            latest: RwLock::new(Arc::new(network)),
            writer_open: AtomicBool::new(false),
            config,
        }
    }

    /// Loads a saved network, its zoom must match the configuration.
    ///
    /// `edge_types` and `turn_cost_types` become the active grouping
    /// functions and must be the ones the stored type ids were derived with.
    pub fn load<P: AsRef<Path>>(
        path: P,
        config: RoutingConfig,
        edge_types: GroupingFunction,
        turn_cost_types: GroupingFunction,
    ) -> Result<Self> {
        let network = RoutingNetwork::load(path, edge_types, turn_cost_types)?;
        if network.zoom() != config.zoom {
            return Err(Error::ZoomMismatch {
                expected: config.zoom,
                found: network.zoom(),
            });
        }
        Ok(Self::from_network(network, config))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.latest().save(path)
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// The current snapshot.
    pub fn latest(&self) -> Arc<RoutingNetwork> {
        self.latest.read().clone()
    }

    /// Opens the writer session, at most one can be open at a time.
    pub fn mutate(&self) -> Result<RouterDbMutator<'_>> {
        if self
            .writer_open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::MutatorAlreadyOpen);
        }

        Ok(RouterDbMutator {
            db: self,
            mutator: self.latest().mutate(),
            committed: false,
        })
    }

    /// Installs a new edge-type grouping function.
    pub fn set_edge_type_map(&self, function: GroupingFunction) -> Result<()> {
        let mut mutator = self.mutate()?;
        mutator.set_edge_type_map(function);
        mutator.commit();
        Ok(())
    }

    /// Installs a new turn-cost-type grouping function.
    pub fn set_turn_cost_type_map(&self, function: GroupingFunction) -> Result<()> {
        let mut mutator = self.mutate()?;
        mutator.set_turn_cost_type_map(function);
        mutator.commit();
        Ok(())
    }

    fn publish(&self, network: RoutingNetwork) -> Arc<RoutingNetwork> {
        let network = Arc::new(network);
        *self.latest.write() = network.clone();
        network
    }
}

/// Exclusive writer session of a [`RouterDb`].
pub struct RouterDbMutator<'a> {
    db: &'a RouterDb,
    mutator: NetworkMutator,
    committed: bool,
}

impl RouterDbMutator<'_> {
    /// Publishes the changes and returns the new snapshot.
    pub fn commit(mut self) -> Arc<RoutingNetwork> {
        self.committed = true;
        self.db.publish(self.mutator.to_network())
    }
}

impl Deref for RouterDbMutator<'_> {
    type Target = NetworkMutator;

    fn deref(&self) -> &NetworkMutator {
        &self.mutator
    }
}

impl DerefMut for RouterDbMutator<'_> {
    fn deref_mut(&mut self) -> &mut NetworkMutator {
        &mut self.mutator
    }
}

impl Drop for RouterDbMutator<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.db.publish(self.mutator.to_network());
        }
        self.db.writer_open.store(false, Ordering::Release);
    }
}
