//! TX/RX packet breakdowns and the output names they are collected under.

/// Output name for the transmit-side breakdown.
pub const OUTPUT_TX: &str = "Routing packet breakdown (TX)";
/// Output name for the receive-side breakdown.
pub const OUTPUT_RX: &str = "Routing packet breakdown (RX)";

pub const LABEL_NEW_DATA: &str = "New data packets";
pub const LABEL_NEW_OTHER: &str = "New other packets";
pub const LABEL_RELAYED_DATA: &str = "Relaid data packets";
pub const LABEL_RELAYED_OTHER: &str = "Relaid other packets";
pub const LABEL_DATA_RX: &str = "Data packets";
pub const LABEL_OTHER_RX: &str = "Other packets";
pub const LABEL_DISCARDED: &str = "Discarded packets";
pub const LABEL_DELIVERED: &str = "Packets forwarded to application layer";

/// Transmit-side counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TxBreakdown {
    pub new_data: u64,
    pub new_other: u64,
    pub relayed_data: u64,
    pub relayed_other: u64,
}

impl TxBreakdown {
    pub fn labelled(&self) -> [(&'static str, u64); 4] {
        [
            (LABEL_NEW_DATA, self.new_data),
            (LABEL_NEW_OTHER, self.new_other),
            (LABEL_RELAYED_DATA, self.relayed_data),
            (LABEL_RELAYED_OTHER, self.relayed_other),
        ]
    }
}

/// Receive-side counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RxBreakdown {
    pub data: u64,
    pub other: u64,
    pub discarded: u64,
    pub delivered: u64,
}

impl RxBreakdown {
    pub fn labelled(&self) -> [(&'static str, u64); 4] {
        [
            (LABEL_DATA_RX, self.data),
            (LABEL_OTHER_RX, self.other),
            (LABEL_DISCARDED, self.discarded),
            (LABEL_DELIVERED, self.delivered),
        ]
    }
}
