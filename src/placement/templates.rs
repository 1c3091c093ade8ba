//! Reference-counted asset template cache
//!
//! One hidden, inert canonical node per asset id. The first acquire starts
//! exactly one engine load; acquires that arrive while the load is in
//! flight attach to it instead of starting another. Entries are disposed
//! when their reference count reaches zero, or force-disposed at teardown.

use std::collections::HashMap;

use crate::engine::{AssetResolver, LoadHandle, LoadState, NodeId, SceneApi};
use crate::error::LoadError;

/// A loaded template
#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub node: NodeId,
    pub refs: u32,
    /// Fast instancing available, or clone-only
    pub instancing: bool,
}

#[derive(Debug)]
enum Slot {
    /// Load in flight; `waiters` counts acquires to convert into refs
    Loading {
        handle: LoadHandle,
        url: String,
        waiters: u32,
    },
    Ready(Template),
}

/// Result of one `acquire` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// Template already loaded; reference count was incremented
    Ready(NodeId),
    /// Load in flight (possibly just started); caller is attached to it
    Pending,
}

/// A load that finished during `update`
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Ready { asset_id: String, node: NodeId },
    Failed { asset_id: String, error: LoadError },
}

/// Template store shared by every placement call site
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: HashMap<String, Slot>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a reference to the template for `asset_id`, starting a load
    /// on first use.
    pub fn acquire<E: SceneApi + AssetResolver + ?Sized>(
        &mut self,
        asset_id: &str,
        engine: &mut E,
    ) -> Acquire {
        match self.entries.get_mut(asset_id) {
            Some(Slot::Ready(template)) => {
                template.refs += 1;
                Acquire::Ready(template.node)
            }
            Some(Slot::Loading { waiters, .. }) => {
                *waiters += 1;
                Acquire::Pending
            }
            None => {
                let url = engine.resolve_url(asset_id);
                let handle = engine.begin_load(&url);
                log::debug!("template `{asset_id}`: load started from {url}");
                self.entries.insert(
                    asset_id.to_string(),
                    Slot::Loading {
                        handle,
                        url,
                        waiters: 1,
                    },
                );
                Acquire::Pending
            }
        }
    }

    /// Poll in-flight loads. Called once per tick; returns the loads that
    /// resolved so the service can materialize deferred placements.
    pub fn update<E: SceneApi + ?Sized>(&mut self, engine: &mut E) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();
        let in_flight: Vec<(String, LoadHandle)> = self
            .entries
            .iter()
            .filter_map(|(id, slot)| match slot {
                Slot::Loading { handle, .. } => Some((id.clone(), *handle)),
                Slot::Ready(_) => None,
            })
            .collect();

        for (asset_id, handle) in in_flight {
            match engine.poll_load(handle) {
                LoadState::Pending => {}
                LoadState::Ready(node) => {
                    let Some(Slot::Loading { waiters, .. }) = self.entries.get(&asset_id) else {
                        continue;
                    };
                    let waiters = *waiters;
                    if waiters == 0 {
                        // Everyone released while the load was in flight
                        log::debug!("template `{asset_id}`: loaded with no holders, disposing");
                        engine.dispose_node(node);
                        self.entries.remove(&asset_id);
                        continue;
                    }
                    engine.set_visible(node, false);
                    let instancing = engine.supports_instancing(node);
                    self.entries.insert(
                        asset_id.clone(),
                        Slot::Ready(Template {
                            node,
                            refs: waiters,
                            instancing,
                        }),
                    );
                    log::debug!("template `{asset_id}`: ready with {waiters} reference(s)");
                    outcomes.push(LoadOutcome::Ready { asset_id, node });
                }
                LoadState::Failed => {
                    // Clear the in-flight marker so a later acquire retries
                    let url = match self.entries.remove(&asset_id) {
                        Some(Slot::Loading { url, .. }) => url,
                        _ => String::new(),
                    };
                    log::warn!("template `{asset_id}`: load failed from {url}");
                    outcomes.push(LoadOutcome::Failed {
                        error: LoadError::Failed {
                            id: asset_id.clone(),
                            url,
                        },
                        asset_id,
                    });
                }
            }
        }
        outcomes
    }

    /// Release one reference. At zero the template node is disposed and the
    /// entry removed. Releasing an unknown id is a warn-level no-op, so the
    /// count can never go negative.
    pub fn release<E: SceneApi + ?Sized>(&mut self, asset_id: &str, engine: &mut E) {
        match self.entries.get_mut(asset_id) {
            Some(Slot::Ready(template)) => {
                template.refs -= 1;
                if template.refs == 0 {
                    let node = template.node;
                    self.entries.remove(asset_id);
                    engine.dispose_node(node);
                    log::debug!("template `{asset_id}`: last reference released, disposed");
                }
            }
            Some(Slot::Loading { waiters, .. }) => {
                if *waiters == 0 {
                    log::warn!("template `{asset_id}`: release with no outstanding acquire");
                } else {
                    *waiters -= 1;
                }
            }
            None => {
                log::warn!("template `{asset_id}`: release of unknown template ignored");
            }
        }
    }

    /// Force-dispose every entry regardless of count (world teardown)
    pub fn release_all<E: SceneApi + ?Sized>(&mut self, engine: &mut E) {
        for (asset_id, slot) in self.entries.drain() {
            match slot {
                Slot::Ready(template) => {
                    engine.dispose_node(template.node);
                    if template.refs > 0 {
                        log::debug!(
                            "template `{asset_id}`: force-disposed with {} reference(s)",
                            template.refs
                        );
                    }
                }
                Slot::Loading { .. } => {
                    log::debug!("template `{asset_id}`: teardown while load in flight");
                }
            }
        }
    }

    /// Current reference count (pending acquires while loading)
    pub fn ref_count(&self, asset_id: &str) -> u32 {
        match self.entries.get(asset_id) {
            Some(Slot::Ready(template)) => template.refs,
            Some(Slot::Loading { waiters, .. }) => *waiters,
            None => 0,
        }
    }

    pub fn template(&self, asset_id: &str) -> Option<Template> {
        match self.entries.get(asset_id) {
            Some(Slot::Ready(template)) => Some(*template),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
