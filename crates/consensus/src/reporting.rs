// consensus/src/reporting.rs

use crate::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use staking_core::BlockNumber;
use staking_crypto::Address;
use std::collections::BTreeMap;

/// Why a validator was banned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BanReason {
    /// Quorum of malice reports
    Malicious,
    /// Governance ballot: blocks produced too late, too often
    OftenBlockDelays,
    /// Governance ballot: too many skipped blocks
    OftenBlockSkips,
    /// Governance ballot: too many beacon reveal skips
    OftenRevealSkips,
    /// Governance ballot: committed but never revealed
    Unrevealed,
}

/// One accusation against a validator for a given block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaliceReport {
    pub reporter: Address,
    pub reported_at: BlockNumber,
    pub proof: Vec<u8>,
}

/// Ban history of a validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanRecord {
    pub ban_counter: u64,
    pub last_reason: BanReason,
    pub banned_until: BlockNumber,
}

/// Malice reports keyed by `(accused, block)` plus per-validator ban history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportBook {
    reports: BTreeMap<(Address, BlockNumber), Vec<MaliceReport>>,
    bans: BTreeMap<Address, BanRecord>,
}

impl ReportBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a report; each reporter accuses a given `(accused, block)` once
    pub fn record_report(
        &mut self,
        accused: Address,
        block: BlockNumber,
        report: MaliceReport,
    ) -> ConsensusResult<()> {
        let reports = self.reports.entry((accused, block)).or_default();
        if reports.iter().any(|r| r.reporter == report.reporter) {
            return Err(ConsensusError::DuplicateReport {
                reporter: report.reporter,
                accused,
                block,
            });
        }
        reports.push(report);
        Ok(())
    }

    pub fn reports(&self, accused: &Address, block: BlockNumber) -> &[MaliceReport] {
        self.reports
            .get(&(*accused, block))
            .map(|r| r.as_slice())
            .unwrap_or(&[])
    }

    /// Reports against `(accused, block)` whose reporter is still in `current`
    pub fn votes(&self, accused: &Address, block: BlockNumber, current: &[Address]) -> usize {
        self.reports(accused, block)
            .iter()
            .filter(|r| current.contains(&r.reporter))
            .count()
    }

    pub fn record_ban(&mut self, validator: Address, reason: BanReason, until: BlockNumber) -> &BanRecord {
        let record = self.bans.entry(validator).or_insert(BanRecord {
            ban_counter: 0,
            last_reason: reason,
            banned_until: 0,
        });
        record.ban_counter += 1;
        record.last_reason = reason;
        record.banned_until = record.banned_until.max(until);
        record
    }

    pub fn ban_record(&self, validator: &Address) -> Option<&BanRecord> {
        self.bans.get(validator)
    }

    pub fn ban_counter(&self, validator: &Address) -> u64 {
        self.bans.get(validator).map(|r| r.ban_counter).unwrap_or(0)
    }

    /// Drop reports about blocks before `oldest`; they can no longer gather votes
    pub fn prune(&mut self, oldest: BlockNumber) {
        self.reports.retain(|(_, block), _| *block >= oldest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(name: &str) -> Address {
        Address::derive(name.as_bytes())
    }

    fn report(reporter: &str) -> MaliceReport {
        MaliceReport {
            reporter: v(reporter),
            reported_at: 10,
            proof: vec![],
        }
    }

    #[test]
    fn test_duplicate_report_rejected() {
        let mut book = ReportBook::new();
        book.record_report(v("x"), 5, report("a")).unwrap();
        assert!(matches!(
            book.record_report(v("x"), 5, report("a")),
            Err(ConsensusError::DuplicateReport { block: 5, .. })
        ));
        book.record_report(v("x"), 6, report("a")).unwrap();
        assert_eq!(book.reports(&v("x"), 5).len(), 1);
    }

    #[test]
    fn test_votes_only_count_current_reporters() {
        let mut book = ReportBook::new();
        book.record_report(v("x"), 5, report("a")).unwrap();
        book.record_report(v("x"), 5, report("b")).unwrap();
        assert_eq!(book.votes(&v("x"), 5, &[v("a"), v("b"), v("x")]), 2);
        assert_eq!(book.votes(&v("x"), 5, &[v("a"), v("x")]), 1);

        book.prune(6);
        assert_eq!(book.votes(&v("x"), 5, &[v("a"), v("b")]), 0);
    }

    #[test]
    fn test_ban_counter() {
        let mut book = ReportBook::new();
        book.record_ban(v("x"), BanReason::Malicious, 100);
        let record = book.record_ban(v("x"), BanReason::Unrevealed, 50);
        assert_eq!(record.ban_counter, 2);
        assert_eq!(record.last_reason, BanReason::Unrevealed);
        assert_eq!(record.banned_until, 100);
        assert_eq!(book.ban_counter(&v("y")), 0);
    }
}
