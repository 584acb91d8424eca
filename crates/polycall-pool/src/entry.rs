/// A connection entry's lifecycle state (`spec.md` §3 "Connection pool
/// entry").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Idle,
    Active,
    Cooling,
    Error,
}

/// One leased or leasable connection (`spec.md` §3: "`{endpoint, state,
/// last_activity, request_count}`").
#[derive(Debug, Clone)]
pub struct PoolEntry {
    pub endpoint: String,
    pub state: EntryState,
    pub last_activity_ns: u64,
    pub request_count: u64,
    pub(crate) created_seq: u64,
    pub(crate) cooling_since_ns: Option<u64>,
}
