//! Round-trip detection: funds leaving an entity and returning to it
//! through intermediaries, with only fees lost along the way.

use crate::config::RoundTripConfig;
use crate::detector::PatternDetector;
use crate::error::{AmlError, AmlResult};
use crate::graph::TxnGraph;
use crate::types::{Amount, PatternKind, PatternMatch, Severity, Transaction};
use chrono::Duration;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct RoundTrip {
    config: RoundTripConfig,
}

struct LoopSearch<'a> {
    graph: &'a TxnGraph,
    transactions: &'a [Transaction],
    max_duration: Duration,
    keep_fraction: Decimal,
    min_amount: Amount,
    max_hops: usize,
    matches: Vec<PatternMatch>,
}

impl RoundTrip {
    pub fn new(config: RoundTripConfig) -> AmlResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RoundTripConfig {
        &self.config
    }

    fn severity(&self, amount: Amount) -> Severity {
        if amount >= Decimal::from(1_000_000) {
            Severity::Critical
        } else if amount >= Decimal::from(500_000) {
            Severity::High
        } else if amount >= Decimal::from(150_000) {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Rises with loop length and with how little was lost to fees.
    fn confidence(&self, hops: usize, loss_fraction: f64) -> f64 {
        let retention = 1.0 - loss_fraction / self.config.max_loss_fraction;
        (0.5 + 0.08 * (hops - 2) as f64 + 0.2 * retention).clamp(0.0, 0.99)
    }
}

impl<'a> LoopSearch<'a> {
    fn walk(
        &mut self,
        origin: usize,
        chain: &mut Vec<usize>,
        visited: &mut Vec<bool>,
        round_trip: &RoundTrip,
    ) {
        let last = self.graph.edge(chain[chain.len() - 1]);
        let start = self.graph.edge(chain[0]);
        if chain.len() >= self.max_hops {
            return;
        }

        for &next_idx in self.graph.outgoing(last.to) {
            let next = self.graph.edge(next_idx);
            if next.timestamp <= last.timestamp
                || next.timestamp - start.timestamp > self.max_duration
                // Fees only ever shrink the moving amount.
                || next.amount > last.amount
                || next.amount < start.amount * self.keep_fraction
            {
                continue;
            }
            if next.to == origin {
                chain.push(next_idx);
                self.matches.push(self.emit(chain, round_trip));
                chain.pop();
                continue;
            }
            if visited[next.to] {
                continue;
            }
            visited[next.to] = true;
            chain.push(next_idx);
            self.walk(origin, chain, visited, round_trip);
            chain.pop();
            visited[next.to] = false;
        }
    }

    fn emit(&self, chain: &[usize], round_trip: &RoundTrip) -> PatternMatch {
        let edges: Vec<_> = chain.iter().map(|&i| self.graph.edge(i)).collect();
        let first = edges[0];
        let last = edges[edges.len() - 1];
        let duration = last.timestamp - first.timestamp;
        let loss_fraction = ((first.amount - last.amount) / first.amount)
            .to_f64()
            .unwrap_or(0.0);
        let severity = round_trip.severity(first.amount);

        let origin = self.graph.node_id(first.from).clone();
        let mut entities = BTreeSet::new();
        entities.insert(origin.clone());
        for e in &edges {
            entities.insert(self.graph.node_id(e.to).clone());
        }

        log::warn!(
            "round_trip: origin={} hops={} amount={} loss={:.1}% severity={}",
            origin,
            edges.len(),
            first.amount,
            loss_fraction * 100.0,
            severity
        );

        PatternMatch {
            pattern: PatternKind::RoundTrip,
            severity,
            confidence: round_trip.confidence(edges.len(), loss_fraction),
            description: format!(
                "{} sent to itself through {} intermediaries over {} days, losing {:.1}% to fees",
                first.amount,
                edges.len() - 1,
                duration.num_days(),
                loss_fraction * 100.0
            ),
            entities,
            transactions: edges
                .iter()
                .map(|e| self.transactions[e.txn].id.clone())
                .collect(),
            // Aggregate reported per match: the originating amount.
            total_amount: first.amount,
            currency: self.transactions[first.txn].currency.clone(),
            window_start: first.timestamp,
            window_end: last.timestamp,
            details: serde_json::json!({
                "origin": origin,
                "hops": edges.len(),
                "outbound_amount": first.amount,
                "returned_amount": last.amount,
                "loss_fraction": loss_fraction,
                "duration_days": duration.num_days(),
            }),
        }
    }
}

impl PatternDetector for RoundTrip {
    fn name(&self) -> &'static str {
        "round_trip"
    }

    fn detect(&self, transactions: &[Transaction]) -> AmlResult<Vec<PatternMatch>> {
        let keep_fraction = Decimal::from_f64(1.0 - self.config.max_loss_fraction)
            .ok_or_else(|| AmlError::config("max_loss_fraction is not representable"))?;
        let graph = TxnGraph::build(transactions);

        let mut search = LoopSearch {
            graph: &graph,
            transactions,
            max_duration: Duration::days(self.config.max_loop_days),
            keep_fraction,
            min_amount: self.config.min_amount,
            max_hops: self.config.max_hops,
            matches: Vec::new(),
        };

        for origin in 0..graph.node_count() {
            for &edge_idx in graph.outgoing(origin) {
                let edge = graph.edge(edge_idx);
                if edge.amount < search.min_amount || edge.to == origin {
                    continue;
                }
                let mut visited = vec![false; graph.node_count()];
                visited[origin] = true;
                visited[edge.to] = true;
                let mut chain = vec![edge_idx];
                search.walk(origin, &mut chain, &mut visited, self);
            }
        }

        Ok(search.matches)
    }
}
