//! RSS 2.0 feed parsing.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::errors::SiteError;
use crate::lenient::{parse_i64, parse_timestamp};
use crate::types::RssTorrent;

/// An `<item>` of `rss/channel` as written in the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub enclosure_url: String,
    pub enclosure_length: String,
    pub guid: String,
    pub pub_date: String,
}

impl RssItem {
    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "title" => Some(&mut self.title),
            "description" => Some(&mut self.description),
            "link" => Some(&mut self.link),
            "guid" => Some(&mut self.guid),
            "pubDate" => Some(&mut self.pub_date),
            _ => None,
        }
    }

    fn read_enclosure(&mut self, element: &BytesStart<'_>) {
        for attribute in element.attributes().flatten() {
            let value = match attribute.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(e) => {
                    tracing::warn!("Keeping undecoded enclosure attribute: {e}");
                    String::from_utf8_lossy(&attribute.value).into_owned()
                }
            };
            match attribute.key.local_name().as_ref() {
                b"url" => self.enclosure_url = value,
                b"length" => self.enclosure_length = value,
                _ => {}
            }
        }
    }
}

/// Parses the `channel/item` elements of an RSS 2.0 document.
///
/// # Errors
/// - `SiteError::RssParse` - The document is not well-formed XML
pub fn parse_items(xml: &[u8]) -> Result<Vec<RssItem>, SiteError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut path: Vec<String> = Vec::new();
    let mut current: Option<RssItem> = None;
    let mut items = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                let parent_is_channel = path.last().is_some_and(|p| p == "channel");
                if name == "item" && parent_is_channel && current.is_none() {
                    current = Some(RssItem::default());
                } else if name == "enclosure" {
                    if let Some(item) = current.as_mut() {
                        item.read_enclosure(&e);
                    }
                }
                path.push(name);
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"enclosure" {
                    if let Some(item) = current.as_mut() {
                        item.read_enclosure(&e);
                    }
                }
            }
            Ok(Event::End(_)) => {
                let name = path.pop().unwrap_or_default();
                let parent_is_channel = path.last().is_some_and(|p| p == "channel");
                if name == "item" && parent_is_channel {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                }
            }
            Ok(Event::Text(e)) => {
                // HTML entities such as `&nbsp;` are not XML; keep such text as written.
                let text = match e.unescape() {
                    Ok(text) => text.into_owned(),
                    Err(err) => {
                        tracing::warn!("Keeping undecoded RSS text: {err}");
                        String::from_utf8_lossy(&e).into_owned()
                    }
                };
                append_text(&mut current, &path, &text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                append_text(&mut current, &path, &text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SiteError::RssParse {
                    reason: format!("XML parse error at {}: {e}", reader.buffer_position()),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(items)
}

/// Appends text to the item field named by the innermost element, but only
/// for direct children of `<item>`.
fn append_text(current: &mut Option<RssItem>, path: &[String], text: &str) {
    let Some(item) = current.as_mut() else {
        return;
    };
    let [.., parent, field] = path else {
        return;
    };
    if parent != "item" {
        return;
    }
    if let Some(slot) = item.field_mut(field) {
        slot.push_str(text);
    }
}

/// Converts feed items into torrents.
///
/// Items without a title, or without both an enclosure and a link, are
/// dropped. When only the link is present it is used as the download URL and
/// the link is cleared.
pub fn to_torrents(items: Vec<RssItem>) -> Vec<RssTorrent> {
    items
        .into_iter()
        .filter_map(|item| {
            if item.title.is_empty() {
                tracing::warn!("Skipping RSS item without title");
                return None;
            }
            let (enclosure, link) = match (item.enclosure_url.is_empty(), item.link.is_empty()) {
                (true, true) => {
                    tracing::warn!("Skipping RSS item '{}' without links", item.title);
                    return None;
                }
                (true, false) => (item.link, String::new()),
                _ => (item.enclosure_url, item.link),
            };
            Some(RssTorrent {
                id: item.guid,
                title: item.title,
                enclosure,
                size: parse_i64(&item.enclosure_length),
                description: item.description,
                link,
                pub_date: parse_timestamp(&item.pub_date),
            })
        })
        .collect()
}

/// Parses an RSS document straight into torrents.
///
/// # Errors
/// - `SiteError::RssParse` - The document is not well-formed XML
pub fn parse_torrents(xml: &[u8]) -> Result<Vec<RssTorrent>, SiteError> {
    Ok(to_torrents(parse_items(xml)?))
}
