use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::Table;
use crate::registry::Registry;

/// Summary of FK graph structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Table dependency graph. Nodes are tables in declaration order; an edge
/// from `T` to `R` means `T` has a foreign key referencing `R`.
#[derive(Debug, Clone)]
pub struct DependencyGraph<'a> {
    names: Vec<&'a str>,
    depends_on: Vec<BTreeSet<usize>>,
}

impl<'a> DependencyGraph<'a> {
    /// Build the graph. Fails with [`Error::UnknownReference`] when a foreign
    /// key targets a table that is not in `tables`.
    pub fn build(tables: &'a Registry<Table>) -> Result<Self> {
        let mut graph = Self::empty(tables);
        for (idx, table) in tables.values().enumerate() {
            for fk in &table.foreign_keys {
                let target = tables.position(&fk.ref_table).ok_or_else(|| {
                    Error::UnknownReference {
                        table: table.name.clone(),
                        target: format!("table: {}", fk.ref_table),
                    }
                })?;
                graph.depends_on[idx].insert(target);
            }
        }
        Ok(graph)
    }

    /// Build the graph from resolvable foreign keys only. Keys targeting a
    /// table that is not in `tables` contribute no edge.
    pub fn build_known(tables: &'a Registry<Table>) -> Self {
        let mut graph = Self::empty(tables);
        for (idx, table) in tables.values().enumerate() {
            let targets = table
                .foreign_keys
                .iter()
                .filter_map(|fk| tables.position(&fk.ref_table));
            graph.depends_on[idx].extend(targets);
        }
        graph
    }

    fn empty(tables: &'a Registry<Table>) -> Self {
        let names: Vec<&str> = tables.keys().collect();
        let depends_on = vec![BTreeSet::new(); names.len()];
        Self { names, depends_on }
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            nodes: self.names.len(),
            edges: self.depends_on.iter().map(BTreeSet::len).sum(),
        }
    }

    /// Order tables so every referenced table precedes its referrers.
    ///
    /// Ready tables are taken in declaration order, so the result is stable
    /// for a given input. A cycle fails with [`Error::Cycle`] carrying one
    /// closed path through the cycle, e.g. `[a, b, a]`.
    pub fn toposort(&self) -> Result<Vec<String>> {
        let mut pending: Vec<usize> = self.depends_on.iter().map(BTreeSet::len).collect();
        let mut dependents: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (node, targets) in self.depends_on.iter().enumerate() {
            for target in targets {
                dependents.entry(*target).or_default().push(node);
            }
        }

        let mut ready: BTreeSet<usize> = pending
            .iter()
            .enumerate()
            .filter_map(|(node, count)| if *count == 0 { Some(node) } else { None })
            .collect();

        let mut emitted = vec![false; self.names.len()];
        let mut order = Vec::with_capacity(self.names.len());

        while let Some(node) = ready.pop_first() {
            emitted[node] = true;
            order.push(self.names[node].to_string());

            for dependent in dependents.get(&node).into_iter().flatten() {
                let count = &mut pending[*dependent];
                *count = count.saturating_sub(1);
                if *count == 0 {
                    ready.insert(*dependent);
                }
            }
        }

        if order.len() == self.names.len() {
            Ok(order)
        } else {
            Err(Error::Cycle(self.find_cycle(&emitted)))
        }
    }

    fn find_cycle(&self, emitted: &[bool]) -> Vec<String> {
        // every node left over has at least one dependency that is also left over
        let Some(start) = emitted.iter().position(|done| !done) else {
            return Vec::new();
        };

        let mut path: Vec<usize> = Vec::new();
        let mut seen: BTreeMap<usize, usize> = BTreeMap::new();
        let mut current = start;
        loop {
            if let Some(&pos) = seen.get(&current) {
                let mut cycle: Vec<String> = path[pos..]
                    .iter()
                    .map(|node| self.names[*node].to_string())
                    .collect();
                cycle.push(self.names[current].to_string());
                return cycle;
            }
            seen.insert(current, path.len());
            path.push(current);
            match self.depends_on[current].iter().find(|dep| !emitted[**dep]) {
                Some(next) => current = *next,
                None => {
                    return path
                        .iter()
                        .map(|node| self.names[*node].to_string())
                        .collect();
                }
            }
        }
    }
}

/// Compute the table emission order for `tables`.
pub fn resolve_order(tables: &Registry<Table>) -> Result<Vec<String>> {
    let graph = DependencyGraph::build(tables)?;
    let order = graph.toposort()?;
    let summary = graph.summary();
    tracing::debug!(
        event = "order_resolved",
        nodes = summary.nodes,
        edges = summary.edges
    );
    Ok(order)
}
