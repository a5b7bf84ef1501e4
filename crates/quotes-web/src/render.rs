//! HTML rendering of quote listings.
//!
//! Uses `quick-xml`'s writer so every piece of user text and every attribute
//! value is escaped on the way out.

use std::{io::Cursor, sync::LazyLock};

use quick_xml::{
  Writer,
  events::{BytesEnd, BytesStart, BytesText, Event},
};
use quotes_core::quote::RatedQuote;
use regex::Regex;

use crate::error::Error;

/// IRC-style `<nick> message` segments; each renders on its own line.
static SEGMENT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"<[^>]+>[^<]+").unwrap(/* known good */));

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const STYLE: &str = r#"
body, html {
  font-size: 62.5%;
  margin-top: 50px;
  font-family: 'Lato', sans-serif;
  color: #AAAFB6;
  background-color: #5F6B7B;
}
a { color: #294977; text-decoration: none; }
a:hover { text-decoration: underline; }
.container { width: 80%; margin: 0 auto; font-size: 1.4rem; }
.quotes {
  background-color: rgba(0,0,0,0.3);
  box-shadow: 0px 0px 10px 0px rgba(0,0,0,0.6);
  border-radius: 3px;
}
h1 { font-size: 2.6rem; padding: 0; margin: 0; padding-bottom: 1rem; }
table { width: 100%; border-collapse: collapse; }
table thead tr td {
  font-weight: bold;
  border-bottom: solid 1px rgba(255,255,255,0.1);
  background-color: rgba(255,255,255,0.1);
}
table tbody tr td { vertical-align: top; border-bottom: solid 1px rgba(0,0,0,0.1); }
table tbody tr:nth-child(2n) td { background-color: rgba(0,0,0,0.05); }
table tbody tr:hover { background-color: rgba(255,255,255,0.1); }
table .id { padding: 0 8px; max-width: 50px; width: 20px; }
table .author { padding: 0 4px; max-width: 100px; width: 60px; }
table .date { width: 140px; max-width: 140px; }
table .votes, table .upvotes, table .downvotes { width: 50px; max-width: 60px; }
.footer { margin-top: 20px; text-align: center; }
.empty { font-size: 2rem; text-align: center; }
"#;

// ─── Page model ──────────────────────────────────────────────────────────────

/// Everything needed to render one page.
pub struct Listing<'a> {
  pub title:  &'a str,
  pub quotes: &'a [RatedQuote],
  /// Cached total of stored quotes, filtered or not.
  pub total:  u64,
  /// The request's query pairs, carried into the header links.
  pub query:  &'a [(String, String)],
}

impl Listing<'_> {
  fn all_href(&self) -> String { href(self.query, "all") }

  fn votesort_href(&self) -> String { href(self.query, "votesort") }
}

/// `/?` plus the current query with `key` set to `true`, keys in sorted order.
fn href(query: &[(String, String)], key: &str) -> String {
  let mut pairs: Vec<(&str, &str)> = query
    .iter()
    .filter(|(k, _)| k != key)
    .map(|(k, v)| (k.as_str(), v.as_str()))
    .collect();
  pairs.push((key, "true"));
  pairs.sort_by_key(|&(k, _)| k);

  let encoded = url::form_urlencoded::Serializer::new(String::new())
    .extend_pairs(pairs)
    .finish();
  format!("/?{encoded}")
}

/// Split quote text into display lines on `<nick> message` boundaries.
/// Text without such segments is a single line.
pub fn split_lines(text: &str) -> Vec<&str> {
  let lines: Vec<&str> = SEGMENT.find_iter(text).map(|m| m.as_str()).collect();
  if lines.is_empty() { vec![text] } else { lines }
}

// ─── Writer ──────────────────────────────────────────────────────────────────

struct Page {
  writer: Writer<Cursor<Vec<u8>>>,
}

impl Page {
  fn new() -> Self { Self { writer: Writer::new(Cursor::new(Vec::new())) } }

  fn event<'e>(&mut self, event: Event<'e>) -> Result<(), Error> {
    self
      .writer
      .write_event(event)
      .map_err(|e| Error::Render(e.to_string()))
  }

  fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<(), Error> {
    self.event(Event::Start(
      BytesStart::new(tag).with_attributes(attrs.iter().copied()),
    ))
  }

  fn close(&mut self, tag: &str) -> Result<(), Error> {
    self.event(Event::End(BytesEnd::new(tag)))
  }

  fn void(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<(), Error> {
    self.event(Event::Empty(
      BytesStart::new(tag).with_attributes(attrs.iter().copied()),
    ))
  }

  fn text(&mut self, text: &str) -> Result<(), Error> {
    self.event(Event::Text(BytesText::new(text)))
  }

  fn element(&mut self, tag: &str, attrs: &[(&str, &str)], text: &str) -> Result<(), Error> {
    self.open(tag, attrs)?;
    self.text(text)?;
    self.close(tag)
  }

  fn finish(self) -> Vec<u8> { self.writer.into_inner().into_inner() }
}

// ─── Rendering ───────────────────────────────────────────────────────────────

pub fn render(listing: &Listing<'_>) -> Result<Vec<u8>, Error> {
  let mut page = Page::new();

  page.event(Event::DocType(BytesText::from_escaped("html")))?;
  page.open("html", &[])?;

  page.open("head", &[])?;
  page.element("title", &[], listing.title)?;
  page.void("link", &[
    ("href", "https://fonts.googleapis.com/css?family=Lato"),
    ("rel", "stylesheet"),
    ("type", "text/css"),
  ])?;
  page.open("style", &[])?;
  // CSS is raw text in HTML; it must not be entity-escaped.
  page.event(Event::Text(BytesText::from_escaped(STYLE)))?;
  page.close("style")?;
  page.close("head")?;

  page.open("body", &[])?;
  page.open("div", &[("class", "container")])?;

  if listing.quotes.is_empty() {
    page.open("div", &[("class", "empty")])?;
    page.text("There are no quotes yet (")?;
    page.element("a", &[("href", listing.all_href().as_str())], "show all")?;
    page.text(").")?;
    page.close("div")?;
  } else {
    render_header(&mut page, listing)?;
    render_table(&mut page, listing.quotes)?;

    page.open("div", &[("class", "footer")])?;
    page.text(&format!(
      "{} quotes ({} stored).",
      listing.quotes.len(),
      listing.total
    ))?;
    page.close("div")?;
  }

  page.close("div")?;
  page.close("body")?;
  page.close("html")?;
  Ok(page.finish())
}

fn render_header(page: &mut Page, listing: &Listing<'_>) -> Result<(), Error> {
  page.open("h1", &[])?;
  page.text(&format!("{} (", listing.title))?;
  page.element("a", &[("href", listing.all_href().as_str())], "show all")?;
  page.text(") (")?;
  page.element("a", &[("href", listing.votesort_href().as_str())], "votesort")?;
  page.text(")")?;
  page.close("h1")
}

fn render_table(page: &mut Page, quotes: &[RatedQuote]) -> Result<(), Error> {
  page.open("div", &[("class", "quotes")])?;
  page.open("table", &[])?;

  page.open("thead", &[])?;
  page.open("tr", &[])?;
  for (class, label) in [
    ("id", "ID"),
    ("votes", "Votes"),
    ("quote", "Quote"),
    ("author", "Author"),
    ("date", "Date"),
    ("upvotes", "Up"),
    ("downvotes", "Down"),
  ] {
    page.element("td", &[("class", class)], label)?;
  }
  page.close("tr")?;
  page.close("thead")?;

  page.open("tbody", &[])?;
  for rq in quotes {
    page.open("tr", &[])?;
    page.element("td", &[("class", "id")], &rq.id().to_string())?;
    page.element("td", &[("class", "votes")], &rq.score().to_string())?;

    page.open("td", &[("class", "quote")])?;
    for (i, line) in split_lines(&rq.quote.text).into_iter().enumerate() {
      if i > 0 {
        page.void("br", &[])?;
      }
      page.text(line)?;
    }
    page.close("td")?;

    page.element("td", &[("class", "author")], &rq.quote.author)?;
    page.element(
      "td",
      &[("class", "date")],
      &rq.quote.created_at.format(DATE_FORMAT).to_string(),
    )?;
    page.element("td", &[("class", "upvotes")], &rq.votes.up.to_string())?;
    page.element("td", &[("class", "downvotes")], &rq.votes.down.to_string())?;
    page.close("tr")?;
  }
  page.close("tbody")?;

  page.close("table")?;
  page.close("div")
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use quotes_core::quote::{Quote, QuoteId, VoteTally};

  use super::*;

  fn rated(id: i64, text: &str, up: u64, down: u64) -> RatedQuote {
    RatedQuote {
      quote: Quote {
        id:         QuoteId(id),
        created_at: Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap(),
        author:     "Ada & co".into(),
        text:       text.into(),
      },
      votes: VoteTally { up, down },
    }
  }

  fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
    raw.iter().map(|&(k, v)| (k.to_owned(), v.to_owned())).collect()
  }

  fn render_str(listing: &Listing<'_>) -> String {
    String::from_utf8(render(listing).unwrap()).unwrap()
  }

  #[test]
  fn splits_irc_lines() {
    assert_eq!(
      split_lines("<ada> hi there <bob> hello"),
      vec!["<ada> hi there ", "<bob> hello"]
    );
    assert_eq!(split_lines("plain text"), vec!["plain text"]);
    assert_eq!(split_lines(""), vec![""]);
  }

  #[test]
  fn renders_rows_escaped() {
    let quotes = [rated(2, "<ada> a>b <bob> ok", 3, 1)];
    let html = render_str(&Listing {
      title:  "Quotes",
      quotes: &quotes,
      total:  5,
      query:  &[],
    });

    assert!(html.starts_with("<!DOCTYPE html>"), "{html}");
    assert!(html.contains("&lt;ada&gt; a&gt;b "), "{html}");
    assert!(html.contains("<br/>&lt;bob&gt; ok"), "{html}");
    assert!(html.contains("Ada &amp; co"), "{html}");
    assert!(html.contains("2020-01-02 03:04:05"), "{html}");
    assert!(html.contains(r#"<td class="votes">2</td>"#), "{html}");
    assert!(html.contains("1 quotes (5 stored)."), "{html}");
    assert!(html.contains("font-family: 'Lato'"), "{html}");
  }

  #[test]
  fn links_keep_current_flags() {
    let quotes = [rated(1, "q", 0, 0)];
    let query = pairs(&[("votesort", "true")]);
    let html = render_str(&Listing {
      title:  "Quotes",
      quotes: &quotes,
      total:  1,
      query:  &query,
    });
    assert!(html.contains(r#"href="/?all=true&amp;votesort=true""#), "{html}");
    assert!(html.contains(r#"href="/?votesort=true""#), "{html}");
  }

  #[test]
  fn links_keep_unrelated_parameters() {
    let query = pairs(&[("page", "2"), ("all", "false"), ("q", "a b&c")]);
    assert_eq!(href(&query, "all"), "/?all=true&page=2&q=a+b%26c");
    assert_eq!(
      href(&query, "votesort"),
      "/?all=false&page=2&q=a+b%26c&votesort=true"
    );
  }

  #[test]
  fn empty_listing_message() {
    let html = render_str(&Listing {
      title:  "Quotes",
      quotes: &[],
      total:  0,
      query:  &[],
    });
    assert!(html.contains("There are no quotes yet"), "{html}");
    assert!(!html.contains("<table>"), "{html}");
  }
}
