use scraper::{Html, Selector};

use crate::domain::{NewsRecord, RawFeedItem};

/// Separator some feeds use to pack several candidate links into one field.
const LINK_DELIMITER: char = '|';

/// Maps a raw entry into its canonical record. Empty titles and links pass
/// through untouched.
pub fn normalize(item: RawFeedItem, source_name: &str) -> NewsRecord {
    let link = sanitize_link(&item.link);
    let image_url = extract_image(&item);

    NewsRecord {
        title: item.title,
        link,
        source: source_name.to_string(),
        image_url,
        published_at: item.published,
    }
}

/// Keeps the last `|`-separated segment; the trailing candidate is taken
/// as the real URL.
pub fn sanitize_link(raw: &str) -> String {
    match raw.rsplit_once(LINK_DELIMITER) {
        Some((_, last)) => last.to_string(),
        None => raw.to_string(),
    }
}

/// Feed image, then first enclosure, then first `<img src>` in the HTML.
pub fn extract_image(item: &RawFeedItem) -> Option<String> {
    if let Some(image) = item.image.as_ref().filter(|s| !s.is_empty()) {
        return Some(image.clone());
    }

    if let Some(enclosure) = item.enclosure.as_ref().filter(|s| !s.is_empty()) {
        return Some(enclosure.clone());
    }

    item.html
        .as_deref()
        .filter(|html| !html.is_empty())
        .and_then(first_img_src)
}

fn first_img_src(html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    let selector = Selector::parse("img").ok()?;

    fragment
        .select(&selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
}
