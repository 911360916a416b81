//! Arena-indexed transaction graph for the path-based detectors.
//!
//! Entities are nodes, transactions are time-stamped directed edges.
//! Adjacency is held as edge *indices* per node, never as owned pointers,
//! so cycles in the money flow never become cycles in ownership. The graph
//! is built fresh per detection call from caller-supplied data.

use crate::types::{chronological, Amount, EntityId, Transaction};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    /// Index into the caller's transaction slice.
    pub txn: usize,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct TxnGraph {
    nodes: Vec<EntityId>,
    node_index: HashMap<EntityId, usize>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl TxnGraph {
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut graph = TxnGraph::default();

        // Chronological edge order makes traversal deterministic.
        let by_index: HashMap<&str, usize> = transactions
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.as_str(), i))
            .collect();

        for txn in chronological(transactions) {
            let from = graph.intern(&txn.sender_id);
            let to = graph.intern(&txn.receiver_id);
            let edge_idx = graph.edges.len();
            graph.edges.push(Edge {
                from,
                to,
                txn: by_index[txn.id.as_str()],
                amount: txn.amount,
                timestamp: txn.timestamp,
            });
            graph.outgoing[from].push(edge_idx);
            graph.incoming[to].push(edge_idx);
        }

        graph
    }

    fn intern(&mut self, id: &str) -> usize {
        if let Some(&idx) = self.node_index.get(id) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(id.to_string());
        self.node_index.insert(id.to_string(), idx);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        idx
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_id(&self, idx: usize) -> &EntityId {
        &self.nodes[idx]
    }

    /// Outgoing edge indices for a node, in chronological order.
    pub fn outgoing(&self, node: usize) -> &[usize] {
        &self.outgoing[node]
    }

    /// Incoming edge indices for a node, in chronological order.
    pub fn incoming(&self, node: usize) -> &[usize] {
        &self.incoming[node]
    }

    pub fn edge(&self, idx: usize) -> &Edge {
        &self.edges[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionKind;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn txn(id: &str, from: &str, to: &str, hour: u32) -> Transaction {
        Transaction {
            id: id.into(),
            sender_id: from.into(),
            receiver_id: to.into(),
            amount: Decimal::from(1000),
            currency: "EUR".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap(),
            kind: TransactionKind::Wire,
        }
    }

    #[test]
    fn edges_are_chronological_per_node() {
        let txns = vec![txn("t2", "a", "c", 5), txn("t1", "a", "b", 1)];
        let graph = TxnGraph::build(&txns);

        assert_eq!(graph.node_count(), 3);
        let a = graph.edge(0).from;
        assert_eq!(graph.node_id(a), "a");
        let stamps: Vec<_> = graph
            .outgoing(a)
            .iter()
            .map(|&e| graph.edge(e).timestamp)
            .collect();
        assert_eq!(stamps.len(), 2);
        assert!(stamps[0] <= stamps[1], "out-of-order edges");
    }
}
