//! Curriculum path document: nodes, successor links, and gate thresholds.
//!
//! The document is validated once, at the load boundary. The pure status
//! functions in [`crate::path::status`] trust the thresholds they are given
//! and never re-validate.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrellisError};

/// Gate thresholds a node declares before its later steps unlock.
///
/// Every field is optional in the source document; an absent threshold
/// deserializes to `0.0`, which never blocks on score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateThresholds {
    /// Fraction of the deck that must be studied, in [0, 1].
    #[serde(rename = "srsCoverageMin")]
    pub srs_coverage_min: f64,
    /// Minimum quiz score percent, in [0, 100].
    #[serde(rename = "quickTestMin")]
    pub quiz_min: f64,
    /// Minimum listening score percent, in [0, 100].
    #[serde(rename = "listeningMin")]
    pub listening_min: f64,
}

impl GateThresholds {
    /// Reject NaN, negative, or out-of-range thresholds.
    pub fn validate(&self, node_id: &str) -> Result<()> {
        if !self.srs_coverage_min.is_finite() || !(0.0..=1.0).contains(&self.srs_coverage_min) {
            return Err(TrellisError::content(format!(
                "node {}: srsCoverageMin {} out of range [0, 1]",
                node_id, self.srs_coverage_min
            )));
        }
        for (name, value) in [("quickTestMin", self.quiz_min), ("listeningMin", self.listening_min)]
        {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(TrellisError::content(format!(
                    "node {}: {} {} out of range [0, 100]",
                    node_id, name, value
                )));
            }
        }
        Ok(())
    }
}

/// One curriculum node: a deck plus the gates over its steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathNode {
    pub id: String,
    pub title: String,
    /// Deck this node's study and coverage refer to.
    #[serde(rename = "deckId")]
    pub deck_id: String,
    #[serde(default)]
    pub gates: GateThresholds,
    /// Successor node id, absent on the final node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// The whole curriculum: a designated start node and the node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathDoc {
    pub start: String,
    pub nodes: Vec<PathNode>,
}

impl PathDoc {
    /// Parse a path document from JSON and validate it.
    pub fn from_json(raw: &str) -> Result<Self> {
        let doc: PathDoc = serde_json::from_str(raw)?;
        doc.validate()?;
        Ok(doc)
    }

    /// Validate node identity and link integrity: ids must be non-empty and
    /// unique, and `start` and every `next` link must resolve.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(TrellisError::content("path has no nodes"));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.id.is_empty() {
                return Err(TrellisError::content(format!("node at index {} has an empty id", i)));
            }
            if self.nodes.iter().filter(|n| n.id == node.id).count() > 1 {
                return Err(TrellisError::content(format!("duplicate node id: {}", node.id)));
            }
            node.gates.validate(&node.id)?;
        }

        if self.node(&self.start).is_none() {
            return Err(TrellisError::content(format!(
                "start references unknown node: {}",
                self.start
            )));
        }
        for node in &self.nodes {
            if let Some(next) = &node.next {
                if self.node(next).is_none() {
                    return Err(TrellisError::content(format!(
                        "node {} links to unknown node: {}",
                        node.id, next
                    )));
                }
            }
        }

        // The chain from start must terminate; a revisited id is a cycle.
        let mut visited = std::collections::HashSet::new();
        let mut current = Some(self.start.as_str());
        while let Some(id) = current {
            if !visited.insert(id) {
                return Err(TrellisError::content(format!(
                    "path contains a cycle through node: {}",
                    id
                )));
            }
            current = self.node(id).and_then(|n| n.next.as_deref());
        }

        Ok(())
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&PathNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

// =============================================================================
// Tests
// =============================================================================
