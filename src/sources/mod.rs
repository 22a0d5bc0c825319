pub mod normalize;
pub mod rss_atom;
pub mod traits;

pub use normalize::{extract_image, normalize, sanitize_link};
pub use rss_atom::RssAtomFetcher;
pub use traits::FeedFetcher;
