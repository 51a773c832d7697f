mod peer_whitelist;

pub use peer_whitelist::{PeerWhitelistFactory, PeerWhitelistService};
