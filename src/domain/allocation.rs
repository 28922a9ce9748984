//! Target allocations and transition-based order routing.
//!
//! The fractional simulator re-applies the allocation every bar. Hosted
//! platforms instead hold an explicit invested flag per instrument and only
//! send target-percent orders when the signal flips; [`OrderRouter`] does
//! the latter against an [`OrderPort`].

use crate::domain::signal::SignalFrame;
use crate::domain::simulation::InstrumentFault;
use crate::ports::order_port::OrderPort;
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Desired share of portfolio value for one instrument at one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetAllocation {
    pub timestamp: NaiveDateTime,
    pub instrument: String,
    pub fraction: f64,
}

/// One target per bar per instrument: `allocation` while the signal is on,
/// otherwise 0.
pub fn target_allocations(frame: &SignalFrame, allocation: f64) -> Vec<TargetAllocation> {
    let mut targets = Vec::with_capacity(frame.len() * frame.columns.len());
    for (i, timestamp) in frame.timestamps.iter().enumerate() {
        for column in &frame.columns {
            targets.push(TargetAllocation {
                timestamp: *timestamp,
                instrument: column.code.clone(),
                fraction: if column.signals[i] { allocation } else { 0.0 },
            });
        }
    }
    targets
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingReport {
    pub orders_sent: usize,
    pub faults: Vec<InstrumentFault>,
}

/// Sends target-percent orders when an instrument's target moves between
/// flat and invested.
#[derive(Debug, Clone, Default)]
pub struct OrderRouter {
    invested: HashMap<String, bool>,
}

impl OrderRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the targets of one bar.
    ///
    /// A rejected entry leaves the instrument flat; a rejected exit leaves it
    /// invested so the exit is retried on the next bar. Either way the other
    /// instruments are unaffected.
    pub fn on_bar(
        &mut self,
        port: &mut dyn OrderPort,
        targets: &[TargetAllocation],
        report: &mut RoutingReport,
    ) {
        for target in targets {
            let wanted = target.fraction > 0.0;
            let invested = self.invested.entry(target.instrument.clone()).or_default();
            if wanted == *invested {
                continue;
            }
            let sent =
                port.order_target_percent(target.timestamp, &target.instrument, target.fraction);
            match sent {
                Ok(()) => {
                    *invested = wanted;
                    report.orders_sent += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        timestamp = %target.timestamp,
                        instrument = %target.instrument,
                        error = %e,
                        "order failed"
                    );
                    report.faults.push(InstrumentFault {
                        timestamp: target.timestamp,
                        instrument: target.instrument.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    /// Route a whole target sequence, as produced by [`target_allocations`],
    /// bar by bar.
    pub fn route(
        &mut self,
        port: &mut dyn OrderPort,
        targets: &[TargetAllocation],
    ) -> RoutingReport {
        let mut report = RoutingReport::default();
        for bar in targets.chunk_by(|a, b| a.timestamp == b.timestamp) {
            self.on_bar(port, bar, &mut report);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::OrderError;
    use crate::domain::signal::SignalColumn;
    use chrono::{Duration, NaiveDate};

    #[derive(Default)]
    struct MockOrderPort {
        orders: Vec<(NaiveDateTime, String, f64)>,
        reject: Option<(String, usize)>,
    }

    impl OrderPort for MockOrderPort {
        fn order_target_percent(
            &mut self,
            timestamp: NaiveDateTime,
            instrument: &str,
            fraction: f64,
        ) -> Result<(), OrderError> {
            if let Some((code, remaining)) = self.reject.as_mut() {
                if code.as_str() == instrument && *remaining > 0 {
                    *remaining -= 1;
                    return Err(OrderError {
                        instrument: instrument.to_string(),
                        reason: "insufficient buying power".into(),
                    });
                }
            }
            self.orders.push((timestamp, instrument.to_string(), fraction));
            Ok(())
        }
    }

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::days(i as i64)
    }

    fn frame(columns: Vec<(&str, Vec<bool>)>) -> SignalFrame {
        let len = columns[0].1.len();
        SignalFrame {
            timestamps: (0..len).map(ts).collect(),
            columns: columns
                .into_iter()
                .map(|(code, signals)| SignalColumn {
                    code: code.to_string(),
                    closes: vec![1.0; signals.len()],
                    signals,
                })
                .collect(),
            offset: 0,
        }
    }

    #[test]
    fn targets_per_bar_per_instrument() {
        let f = frame(vec![("XAU", vec![true, false]), ("XAG", vec![false, true])]);
        let targets = target_allocations(&f, 0.6);

        assert_eq!(targets.len(), 4);
        assert_eq!(targets[0].instrument, "XAU");
        assert_eq!(targets[0].fraction, 0.6);
        assert_eq!(targets[1].instrument, "XAG");
        assert_eq!(targets[1].fraction, 0.0);
        assert_eq!(targets[3].timestamp, ts(1));
        assert_eq!(targets[3].fraction, 0.6);
    }

    #[test]
    fn orders_only_on_transitions() {
        let f = frame(vec![("XAU", vec![false, true, true, true, false, false, true])]);
        let mut port = MockOrderPort::default();
        let mut router = OrderRouter::new();

        let report = router.route(&mut port, &target_allocations(&f, 0.6));

        assert_eq!(report.orders_sent, 3);
        assert!(report.faults.is_empty());
        assert_eq!(
            port.orders,
            vec![
                (ts(1), "XAU".to_string(), 0.6),
                (ts(4), "XAU".to_string(), 0.0),
                (ts(6), "XAU".to_string(), 0.6),
            ]
        );
    }

    #[test]
    fn rejected_entry_is_isolated_and_retried() {
        let f = frame(vec![
            ("XAU", vec![true, true, true]),
            ("XAG", vec![true, true, false]),
        ]);
        let mut port = MockOrderPort {
            reject: Some(("XAU".into(), 1)),
            ..Default::default()
        };
        let mut router = OrderRouter::new();

        let report = router.route(&mut port, &target_allocations(&f, 0.37));

        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].instrument, "XAU");
        assert_eq!(report.faults[0].timestamp, ts(0));
        assert_eq!(
            port.orders,
            vec![
                (ts(0), "XAG".to_string(), 0.37),
                (ts(1), "XAU".to_string(), 0.37),
                (ts(2), "XAG".to_string(), 0.0),
            ]
        );
    }

    #[test]
    fn rejected_exit_is_retried_next_bar() {
        let f = frame(vec![("XAU", vec![true, false, false, false])]);
        let mut port = MockOrderPort::default();
        let mut router = OrderRouter::new();
        let targets = target_allocations(&f, 0.6);

        let mut report = RoutingReport::default();
        router.on_bar(&mut port, &targets[0..1], &mut report);
        port.reject = Some(("XAU".into(), 1));
        router.on_bar(&mut port, &targets[1..2], &mut report);
        router.on_bar(&mut port, &targets[2..3], &mut report);
        router.on_bar(&mut port, &targets[3..4], &mut report);

        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].timestamp, ts(1));
        assert_eq!(report.orders_sent, 2);
        assert_eq!(
            port.orders,
            vec![(ts(0), "XAU".to_string(), 0.6), (ts(2), "XAU".to_string(), 0.0)]
        );
    }

    #[test]
    fn route_groups_targets_by_bar() {
        let f = frame(vec![("XAU", vec![true, true]), ("XAG", vec![false, true])]);
        let mut port = MockOrderPort::default();

        let report = OrderRouter::new().route(&mut port, &target_allocations(&f, 0.5));

        assert_eq!(report.orders_sent, 2);
        assert_eq!(
            port.orders,
            vec![(ts(0), "XAU".to_string(), 0.5), (ts(1), "XAG".to_string(), 0.5)]
        );
    }
}
