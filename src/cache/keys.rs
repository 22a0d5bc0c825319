use sha2::{Digest, Sha256};

use crate::domain::ListingQuery;

pub const NEWS_PREFIX: &str = "news:";

/// `news:<filter digest>:page=<n>:limit=<n>`.
///
/// The digest covers the source names in the order given, each length
/// prefixed so `["a,b"]` and `["a", "b"]` never share a key.
pub fn listing_key(query: &ListingQuery) -> String {
    let mut hasher = Sha256::new();
    for source in &query.sources {
        hasher.update((source.len() as u64).to_be_bytes());
        hasher.update(source.as_bytes());
    }
    let digest = hasher.finalize();
    let short: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();

    format!(
        "{}src={}:page={}:limit={}",
        NEWS_PREFIX, short, query.page, query.limit
    )
}
