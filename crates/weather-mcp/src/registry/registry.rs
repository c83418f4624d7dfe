//! Capability registration and resolution.

use std::collections::HashMap;

use super::capability::{Arguments, Capability, CapabilityKind};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate {kind}: {key}")]
    DuplicateCapability { kind: CapabilityKind, key: String },

    #[error("Invalid URI template {template}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("{kind} not found: {key}")]
    NotFound { kind: CapabilityKind, key: String },

    #[error("Ambiguous resource URI {uri}: matches {}", .candidates.join(", "))]
    AmbiguousMatch { uri: String, candidates: Vec<String> },
}

/// A resolved capability with any bindings extracted from a resource URI.
#[derive(Debug)]
pub struct Resolved<'a> {
    pub capability: &'a Capability,
    pub bindings: Arguments,
}

/// All registered capabilities, in insertion order per kind.
///
/// Built once before any transport starts, then shared read-only.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    tools: Vec<Capability>,
    resources: Vec<Capability>,
    prompts: Vec<Capability>,
    /// Tool and prompt name -> position in its list.
    by_name: HashMap<(CapabilityKind, String), usize>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, capability: Capability) -> Result<(), RegistryError> {
        let kind = capability.kind();

        match kind {
            CapabilityKind::Resource => {
                let shape = capability.template().map(|t| t.shape());
                let collides = self
                    .resources
                    .iter()
                    .any(|existing| existing.template().map(|t| t.shape()) == shape);
                if collides {
                    return Err(RegistryError::DuplicateCapability {
                        kind,
                        key: capability.key().to_string(),
                    });
                }
            }
            CapabilityKind::Tool | CapabilityKind::Prompt => {
                let index_key = (kind, capability.key().to_string());
                if self.by_name.contains_key(&index_key) {
                    return Err(RegistryError::DuplicateCapability {
                        kind,
                        key: index_key.1,
                    });
                }
                let position = self.list(kind).len();
                self.by_name.insert(index_key, position);
            }
        }

        tracing::debug!("Registered {kind}: {}", capability.key());
        self.list_mut(kind).push(capability);
        Ok(())
    }

    pub fn list(&self, kind: CapabilityKind) -> &[Capability] {
        match kind {
            CapabilityKind::Tool => &self.tools,
            CapabilityKind::Resource => &self.resources,
            CapabilityKind::Prompt => &self.prompts,
        }
    }

    fn list_mut(&mut self, kind: CapabilityKind) -> &mut Vec<Capability> {
        match kind {
            CapabilityKind::Tool => &mut self.tools,
            CapabilityKind::Resource => &mut self.resources,
            CapabilityKind::Prompt => &mut self.prompts,
        }
    }

    /// Exact lookup by registry key (name, or template for resources).
    pub fn get(&self, kind: CapabilityKind, key: &str) -> Option<&Capability> {
        match kind {
            CapabilityKind::Resource => self.resources.iter().find(|c| c.key() == key),
            _ => self
                .by_name
                .get(&(kind, key.to_string()))
                .and_then(|&idx| self.list(kind).get(idx)),
        }
    }

    /// Resolve a tool or prompt by name, or a resource by concrete URI.
    pub fn resolve(&self, kind: CapabilityKind, target: &str) -> Result<Resolved<'_>, RegistryError> {
        let not_found = || RegistryError::NotFound {
            kind,
            key: target.to_string(),
        };

        if kind != CapabilityKind::Resource {
            let capability = self.get(kind, target).ok_or_else(not_found)?;
            return Ok(Resolved {
                capability,
                bindings: Arguments::new(),
            });
        }

        let mut best: Vec<(usize, Resolved<'_>)> = Vec::new();
        for capability in &self.resources {
            let Some(template) = capability.template() else {
                continue;
            };
            let Some(bindings) = template.matches(target) else {
                continue;
            };
            let specificity = template.specificity();
            match best.first().map(|(s, _)| *s) {
                Some(top) if specificity < top => continue,
                Some(top) if specificity > top => best.clear(),
                _ => {}
            }
            best.push((specificity, Resolved { capability, bindings }));
        }

        match best.len() {
            0 => Err(not_found()),
            1 => Ok(best.remove(0).1),
            _ => Err(RegistryError::AmbiguousMatch {
                uri: target.to_string(),
                candidates: best
                    .iter()
                    .map(|(_, r)| r.capability.key().to_string())
                    .collect(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.tools.len() + self.resources.len() + self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
