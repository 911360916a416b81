//! Layering detection: chains of transfers through intermediary entities
//! with amounts that stay consistent hop to hop (minus fees), completed
//! inside a tight time budget.

use crate::config::LayeringConfig;
use crate::detector::PatternDetector;
use crate::error::{AmlError, AmlResult};
use crate::graph::TxnGraph;
use crate::types::{Amount, PatternKind, PatternMatch, Severity, Transaction};
use chrono::Duration;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct Layering {
    config: LayeringConfig,
}

struct ChainSearch<'a> {
    graph: &'a TxnGraph,
    transactions: &'a [Transaction],
    max_duration: Duration,
    keep_fraction: Decimal,
    min_hops: usize,
    max_hops: usize,
    chains: Vec<Vec<usize>>,
}

impl Layering {
    pub fn new(config: LayeringConfig) -> AmlResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LayeringConfig {
        &self.config
    }

    fn severity(&self, hops: usize) -> Severity {
        if hops >= self.config.min_hops + 3 {
            Severity::Critical
        } else if hops >= self.config.min_hops + 2 {
            Severity::High
        } else if hops >= self.config.min_hops + 1 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Rises with chain length and with tighter timing.
    fn confidence(&self, hops: usize, duration: Duration) -> f64 {
        let budget = Duration::hours(self.config.max_chain_hours);
        let tightness = 1.0 - duration.num_seconds() as f64 / budget.num_seconds() as f64;
        let raw = 0.5 + 0.1 * (hops - self.config.min_hops) as f64 + 0.2 * tightness;
        raw.clamp(0.0, 0.99)
    }
}

/// Whether `shorter` appears as a contiguous run inside `longer`.
fn is_sub_chain(shorter: &[usize], longer: &[usize]) -> bool {
    shorter.len() < longer.len() && longer.windows(shorter.len()).any(|w| w == shorter)
}

impl<'a> ChainSearch<'a> {
    /// A hop stays in band when it does not grow and sheds at most the fee
    /// tolerance.
    fn in_band(&self, prev: Amount, next: Amount) -> bool {
        next <= prev && next >= prev * self.keep_fraction
    }

    /// Depth-first extension. The time budget runs from the chain's own
    /// first hop, so every start edge gets its full window even when an
    /// earlier band-compatible hop exists upstream.
    fn extend(&mut self, chain: &mut Vec<usize>, visited: &mut Vec<bool>) {
        let last = self.graph.edge(chain[chain.len() - 1]);
        let start = self.graph.edge(chain[0]);
        let mut extended = false;

        if chain.len() < self.max_hops {
            for &next_idx in self.graph.outgoing(last.to) {
                let next = self.graph.edge(next_idx);
                if next.timestamp <= last.timestamp
                    || next.timestamp - start.timestamp > self.max_duration
                    || !self.in_band(last.amount, next.amount)
                    || visited[next.to]
                {
                    continue;
                }
                visited[next.to] = true;
                chain.push(next_idx);
                self.extend(chain, visited);
                chain.pop();
                visited[next.to] = false;
                extended = true;
            }
        }

        if !extended && chain.len() >= self.min_hops {
            self.chains.push(chain.clone());
        }
    }

    fn emit(&self, chain: &[usize], layering: &Layering) -> PatternMatch {
        let edges: Vec<_> = chain.iter().map(|&i| self.graph.edge(i)).collect();
        let first = edges[0];
        let last = edges[edges.len() - 1];
        let duration = last.timestamp - first.timestamp;
        let total: Amount = edges.iter().map(|e| e.amount).sum();
        let hops = edges.len();
        let severity = layering.severity(hops);

        let mut entities = BTreeSet::new();
        entities.insert(self.graph.node_id(first.from).clone());
        for e in &edges {
            entities.insert(self.graph.node_id(e.to).clone());
        }
        let path: Vec<&str> = std::iter::once(first.from)
            .chain(edges.iter().map(|e| e.to))
            .map(|n| self.graph.node_id(n).as_str())
            .collect();

        log::warn!(
            "layering: hops={} origin={} duration_hours={} severity={}",
            hops,
            path[0],
            duration.num_hours(),
            severity
        );

        PatternMatch {
            pattern: PatternKind::Layering,
            severity,
            confidence: layering.confidence(hops, duration),
            description: format!(
                "Funds moved through {} hops ({}) within {} hours with consistent amounts",
                hops,
                path.join(" -> "),
                duration.num_hours()
            ),
            entities,
            transactions: edges
                .iter()
                .map(|e| self.transactions[e.txn].id.clone())
                .collect(),
            total_amount: total,
            currency: self.transactions[first.txn].currency.clone(),
            window_start: first.timestamp,
            window_end: last.timestamp,
            details: serde_json::json!({
                "hops": hops,
                "path": path,
                "initial_amount": first.amount,
                "final_amount": last.amount,
                "duration_hours": duration.num_hours(),
            }),
        }
    }
}

impl PatternDetector for Layering {
    fn name(&self) -> &'static str {
        "layering"
    }

    /// Aggregate reported per match: sum of the hop amounts along the chain.
    fn detect(&self, transactions: &[Transaction]) -> AmlResult<Vec<PatternMatch>> {
        let keep_fraction = Decimal::from_f64(1.0 - self.config.hop_tolerance)
            .ok_or_else(|| AmlError::config("hop_tolerance is not representable"))?;
        let graph = TxnGraph::build(transactions);

        let mut search = ChainSearch {
            graph: &graph,
            transactions,
            max_duration: Duration::hours(self.config.max_chain_hours),
            keep_fraction,
            min_hops: self.config.min_hops,
            max_hops: self.config.max_hops,
            chains: Vec::new(),
        };

        for node in 0..graph.node_count() {
            for &edge_idx in graph.outgoing(node) {
                let edge = graph.edge(edge_idx);
                let mut visited = vec![false; graph.node_count()];
                visited[edge.from] = true;
                visited[edge.to] = true;
                let mut chain = vec![edge_idx];
                search.extend(&mut chain, &mut visited);
            }
        }

        // A search started mid-path rediscovers a run of a longer chain;
        // keep only the maximal chains so a burst is one match, not a fan
        // of sub-chains.
        let chains = std::mem::take(&mut search.chains);
        let matches = chains
            .iter()
            .filter(|c| !chains.iter().any(|other| is_sub_chain(c, other)))
            .map(|c| search.emit(c, self))
            .collect();

        Ok(matches)
    }
}
