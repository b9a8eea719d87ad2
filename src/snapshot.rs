//! Transaction snapshot taken immediately before execution.

use crate::host::TransactionMember;
use serde::Serialize;

/// One package action resolved into the pending transaction.
///
/// Immutable once taken; the record captures what the transaction was
/// about to do, not what it ended up doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageActionRecord {
    pub name: String,
    pub arch: String,
    pub epoch: String,
    pub version: String,
    pub release: String,
    pub action: String,
    pub package_size: u64,
    pub install_size: u64,
}

impl PackageActionRecord {
    pub fn from_member(member: &dyn TransactionMember) -> Self {
        Self {
            name: member.name().to_string(),
            arch: member.arch().to_string(),
            epoch: member.epoch().to_string(),
            version: member.version().to_string(),
            release: member.release().to_string(),
            action: member.action().to_string(),
            package_size: member.package_size(),
            install_size: member.install_size(),
        }
    }
}

/// Snapshot every member of the pending transaction, preserving the
/// host's iteration order.
///
/// No filtering: removals become records too, with sizes read from the
/// package metadata the host keeps around for them.
pub fn snapshot_members<'a>(
    members: impl IntoIterator<Item = &'a dyn TransactionMember>,
) -> Vec<PackageActionRecord> {
    members
        .into_iter()
        .map(PackageActionRecord::from_member)
        .collect()
}
