//! Maintenance scan: marks valid records past their expiration as expired.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::Result;
use crate::record::Status;
use crate::store::Store;
use crate::time::{parse_asn1_time, parse_reference_time};

/// Outcome of a maintenance scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanReport {
    /// Records moved from valid to expired.
    pub expired: usize,
    /// Valid records whose expiration date could not be parsed.
    pub unparsable: usize,
}

impl ScanReport {
    /// Whether the scan changed anything worth saving.
    #[must_use]
    pub const fn modified(&self) -> bool {
        self.expired > 0
    }
}

/// Expires every valid record whose expiration is at or before `reference`.
///
/// Revoked and expired records are left alone. A record with an unparsable
/// expiration date is counted in [`ScanReport::unparsable`] and skipped.
pub fn scan_and_expire(store: &mut Store, reference: DateTime<Utc>) -> ScanReport {
    let mut report = ScanReport::default();

    for pos in 0..store.len() {
        let record = &store.records()[pos];
        if record.status != Status::Valid {
            continue;
        }
        match parse_asn1_time(&record.expiration_date) {
            Ok(expires) if expires <= reference => {
                info!(serial = %record.serial, "expired");
                store.set_status(pos, Status::Expired);
                report.expired += 1;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    serial = %record.serial,
                    error = %e,
                    "skipping record with bad expiration date"
                );
                report.unparsable += 1;
            }
        }
    }

    info!(
        expired = report.expired,
        unparsable = report.unparsable,
        "maintenance scan finished"
    );
    report
}

/// Like [`scan_and_expire`], with the reference instant given as an ASN.1
/// time or RFC 3339 string.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidTimestamp`] if `reference` cannot be parsed;
/// the store is not touched in that case.
pub fn scan_and_expire_at(store: &mut Store, reference: &str) -> Result<ScanReport> {
    let reference = parse_reference_time(reference)?;
    Ok(scan_and_expire(store, reference))
}
