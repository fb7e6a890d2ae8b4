use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Parameter mapping of a node, kept in insertion order.
pub type ParameterSet = Map<String, Value>;

/// Output slot used for every connection in this domain.
pub const MAIN_OUTPUT: &str = "main";

/// A workflow graph in the platform's wire shape.
///
/// `connections` is keyed by the *display name* of the source node, as the
/// platform expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: BTreeMap<String, NodeConnections>,
    #[serde(default)]
    pub active: bool,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new(generate_workflow_name())
    }
}

/// `"Workflow "` followed by eight hex chars of a fresh v4 uuid.
pub fn generate_workflow_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("Workflow {}", &id[..8])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "typeVersion")]
    pub version: u32,
    pub position: Position,
    pub parameters: ParameterSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<ParameterSet>,
    #[serde(default)]
    pub disabled: bool,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, position: Position) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind: kind.into(),
            version: 1,
            position,
            parameters: ParameterSet::new(),
            credentials: None,
            disabled: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Canvas coordinate. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl From<[i32; 2]> for Position {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Position> for [i32; 2] {
    fn from(p: Position) -> Self {
        [p.x, p.y]
    }
}

/// Outgoing connections of one node: `main[output_index]` is the list of
/// targets fed by that output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConnections {
    pub main: Vec<Vec<ConnectionTarget>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub node: String,
    #[serde(rename = "type")]
    pub slot: String,
    pub index: u32,
}

impl ConnectionTarget {
    pub fn main(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            slot: MAIN_OUTPUT.to_string(),
            index: 0,
        }
    }
}

/// A resolved directed edge between two node names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge<'a> {
    pub from: &'a str,
    pub to: &'a str,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: vec![],
            connections: BTreeMap::new(),
            active: false,
        }
    }

    /// Add `from -> to` on the main output. Duplicate edges are ignored.
    pub fn connect(&mut self, from: &str, to: &str) {
        let entry = self.connections.entry(from.to_string()).or_default();
        if entry.main.is_empty() {
            entry.main.push(Vec::new());
        }
        let targets = &mut entry.main[0];
        if !targets.iter().any(|t| t.node == to) {
            targets.push(ConnectionTarget::main(to));
        }
    }

    /// Every edge in the graph, in source-name order.
    pub fn edges(&self) -> impl Iterator<Item = Edge<'_>> {
        self.connections.iter().flat_map(|(from, conns)| {
            conns.main.iter().flatten().map(move |t| Edge {
                from: from.as_str(),
                to: t.node.as_str(),
            })
        })
    }

    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn find_node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Names of nodes with no incoming edge, in node order.
    pub fn entry_points(&self) -> Vec<&str> {
        let targets: std::collections::HashSet<&str> = self.edges().map(|e| e.to).collect();
        self.nodes
            .iter()
            .filter(|n| !targets.contains(n.name.as_str()))
            .map(|n| n.name.as_str())
            .collect()
    }

    /// Breadth-first execution order over enabled nodes, starting at the entry
    /// points. Disabled nodes and nodes only reachable through them are left out.
    pub fn execution_order(&self) -> Vec<&str> {
        let enabled: std::collections::HashSet<&str> = self
            .nodes
            .iter()
            .filter(|n| !n.disabled)
            .map(|n| n.name.as_str())
            .collect();

        let mut order = Vec::new();
        let mut visited = std::collections::HashSet::new();
        let mut queue: std::collections::VecDeque<&str> = self
            .entry_points()
            .into_iter()
            .filter(|n| enabled.contains(n))
            .collect();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            order.push(current);
            for edge in self.edges().filter(|e| e.from == current) {
                if enabled.contains(edge.to) && !visited.contains(edge.to) {
                    queue.push_back(edge.to);
                }
            }
        }

        order
    }
}
