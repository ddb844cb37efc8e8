//! The ordered strategy registry and the one-shot resolution over it.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::strategy::{HeuristicStrategy, LlmStrategy, OrchestratorStrategy, PipelineSettings};
use super::{Orchestrator, UnavailableOrchestrator};
use crate::config::EngineConfig;
use crate::obs;

/// Strategies in cascade order, richest first.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn OrchestratorStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy at the end (lowest priority so far).
    pub fn register(mut self, strategy: impl OrchestratorStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Build the cascade named by `config.strategies`. Unknown names are skipped.
    pub fn from_config(config: &EngineConfig) -> Self {
        let settings = PipelineSettings::from_config(config);
        let mut registry = Self::new();
        for name in &config.strategies {
            registry = match name.as_str() {
                LlmStrategy::NAME => {
                    registry.register(LlmStrategy::new(config.llm.clone(), settings.clone()))
                }
                HeuristicStrategy::NAME => registry.register(HeuristicStrategy::new(settings.clone())),
                other => {
                    warn!(strategy = %other, "ignoring unknown orchestrator strategy");
                    registry
                }
            };
        }
        registry
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

/// Outcome of probing one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeRecord {
    pub strategy: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Which strategy serves requests for the lifetime of the process.
///
/// Computed once by [`resolve`](Self::resolve) and never mutated; share it
/// behind an `Arc`.
pub struct OrchestratorAvailability {
    active: Arc<dyn Orchestrator>,
    strategy: Option<String>,
    probes: Vec<ProbeRecord>,
}

impl OrchestratorAvailability {
    /// Walk `registry` in order and keep the first strategy that probes and
    /// builds. Later strategies are not probed. With no survivor, the active
    /// orchestrator answers every request with "no orchestrator available".
    pub fn resolve(registry: &StrategyRegistry) -> Self {
        let mut probes = Vec::new();

        for strategy in &registry.strategies {
            let name = strategy.name().to_string();
            if !strategy.probe() {
                info!(strategy = %name, "strategy unavailable");
                probes.push(ProbeRecord {
                    strategy: name,
                    available: false,
                    detail: Some("probe failed".to_string()),
                });
                continue;
            }

            match strategy.build() {
                Ok(active) => {
                    probes.push(ProbeRecord {
                        strategy: name.clone(),
                        available: true,
                        detail: None,
                    });
                    obs::emit_orchestrator_resolved(&name, probes.len());
                    return Self {
                        active,
                        strategy: Some(name),
                        probes,
                    };
                }
                Err(e) => {
                    warn!(strategy = %name, error = %e, "strategy probed but failed to build");
                    probes.push(ProbeRecord {
                        strategy: name,
                        available: false,
                        detail: Some(e.to_string()),
                    });
                }
            }
        }

        obs::emit_orchestrator_resolved(super::NO_ORCHESTRATOR, probes.len());
        Self {
            active: Arc::new(UnavailableOrchestrator),
            strategy: None,
            probes,
        }
    }

    pub fn active(&self) -> &Arc<dyn Orchestrator> {
        &self.active
    }

    /// Name of the winning strategy, `None` when nothing initialised.
    pub fn strategy(&self) -> Option<&str> {
        self.strategy.as_deref()
    }

    pub fn is_available(&self) -> bool {
        self.strategy.is_some()
    }

    /// Probe outcomes in cascade order, up to and including the winner.
    pub fn probes(&self) -> &[ProbeRecord] {
        &self.probes
    }
}

impl std::fmt::Debug for OrchestratorAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorAvailability")
            .field("strategy", &self.strategy)
            .field("probes", &self.probes)
            .finish_non_exhaustive()
    }
}
