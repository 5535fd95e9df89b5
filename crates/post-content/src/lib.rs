#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::dbg_macro,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

//! Structured fields carried inside a post's free-text body.
//!
//! The remote schema only has one text column per post, so the capture time of the attached
//! photo and the post's tags travel as leading markers:
//!
//! ```text
//! [PHOTO_TIME:2024-01-15T10:30:00Z][TAGS:餐廳 · 讀書]
//! 內容文本
//! ```
//!
//! The time marker always comes first, the tag marker (if any) right after it, and a single line
//! break separates the markers from the display text.

use chrono::{DateTime, SecondsFormat, Utc};

pub const TIME_MARKER_PREFIX: &str = "[PHOTO_TIME:";
pub const TAGS_MARKER_PREFIX: &str = "[TAGS:";
pub const MARKER_TERMINATOR: char = ']';
pub const TAG_SEPARATOR: char = '·';

const ENCODED_TAG_SEPARATOR: &str = " · ";

/// A post body split into its structured fields and the text shown to users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostContent {
	pub capture_time: Option<DateTime<Utc>>,
	pub tags: Vec<String>,
	pub text: String,
}

impl PostContent {
	#[must_use]
	pub fn new(capture_time: Option<DateTime<Utc>>, tags: Vec<String>, text: impl Into<String>) -> Self {
		Self {
			capture_time,
			tags,
			text: text.into(),
		}
	}

	/// Parses a remote body. Never fails: anything that does not look like a well formed marker
	/// prefix is handed back untouched as display text.
	#[must_use]
	pub fn decode(body: &str) -> Self {
		decode(body)
	}

	#[must_use]
	pub fn encode(&self) -> String {
		encode(self.capture_time, &self.tags, &self.text)
	}
}

/// Builds the body sent to the remote service.
///
/// Tags are trimmed and blank ones dropped; a `]` inside a tag would terminate the marker early,
/// so it is removed. [`decode`] therefore only gives back the exact input tags when they are
/// already trimmed, non-blank and contain neither `]` nor `·`.
#[must_use]
pub fn encode(capture_time: Option<DateTime<Utc>>, tags: &[String], text: &str) -> String {
	let tags = tags
		.iter()
		.map(|tag| tag.replace(MARKER_TERMINATOR, ""))
		.map(|tag| tag.trim().to_string())
		.filter(|tag| !tag.is_empty())
		.collect::<Vec<_>>();

	let mut body = String::with_capacity(text.len() + 64);

	if let Some(time) = capture_time {
		body.push_str(TIME_MARKER_PREFIX);
		body.push_str(&time.to_rfc3339_opts(SecondsFormat::AutoSi, true));
		body.push(MARKER_TERMINATOR);
	}

	if !tags.is_empty() {
		body.push_str(TAGS_MARKER_PREFIX);
		body.push_str(&tags.join(ENCODED_TAG_SEPARATOR));
		body.push(MARKER_TERMINATOR);
	}

	if !body.is_empty() {
		body.push('\n');
	}

	body.push_str(text);
	body
}

#[must_use]
pub fn decode(body: &str) -> PostContent {
	let plain = || PostContent {
		capture_time: None,
		tags: Vec::new(),
		text: body.to_string(),
	};

	let (capture_time, rest) = match leading_marker(body, TIME_MARKER_PREFIX) {
		Marker::Absent => (None, body),
		Marker::Malformed => return plain(),
		Marker::Found { payload, rest } => (parse_capture_time(payload), rest),
	};

	// The tag marker only counts as a leading segment, never somewhere inside the text.
	let (tags, rest) = match leading_marker(rest, TAGS_MARKER_PREFIX) {
		Marker::Absent => (Vec::new(), rest),
		Marker::Malformed => return plain(),
		Marker::Found { payload, rest } => (split_tags(payload), rest),
	};

	if rest.len() == body.len() {
		return plain();
	}

	PostContent {
		capture_time,
		tags,
		text: strip_separator(rest).to_string(),
	}
}

enum Marker<'a> {
	Absent,
	Malformed,
	Found { payload: &'a str, rest: &'a str },
}

fn leading_marker<'a>(input: &'a str, prefix: &str) -> Marker<'a> {
	let Some(after_prefix) = input.strip_prefix(prefix) else {
		return Marker::Absent;
	};

	after_prefix
		.find(MARKER_TERMINATOR)
		.map_or(Marker::Malformed, |end| Marker::Found {
			payload: &after_prefix[..end],
			rest: &after_prefix[end + MARKER_TERMINATOR.len_utf8()..],
		})
}

fn parse_capture_time(payload: &str) -> Option<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(payload.trim())
		.ok()
		.map(|time| time.with_timezone(&Utc))
}

fn split_tags(payload: &str) -> Vec<String> {
	payload
		.split(TAG_SEPARATOR)
		.map(str::trim)
		.filter(|tag| !tag.is_empty())
		.map(ToString::to_string)
		.collect()
}

fn strip_separator(rest: &str) -> &str {
	rest.strip_prefix("\r\n")
		.or_else(|| rest.strip_prefix('\n'))
		.unwrap_or(rest)
}

#[cfg(test)]
mod tests {
	use super::*;

	use chrono::TimeZone;
	use pretty_assertions::assert_eq;

	fn tags(values: &[&str]) -> Vec<String> {
		values.iter().map(ToString::to_string).collect()
	}

	#[test]
	fn decodes_both_markers() {
		let decoded = decode("[PHOTO_TIME:2024-01-15T10:30:00Z][TAGS:餐廳 · 讀書]\n內容文本");

		assert_eq!(
			decoded,
			PostContent {
				capture_time: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()),
				tags: tags(&["餐廳", "讀書"]),
				text: "內容文本".to_string(),
			}
		);
	}

	#[test]
	fn plain_bodies_are_untouched() {
		for body in ["", "just text", "\nleading newline", "a [TAGS:not leading]", "]["] {
			let decoded = decode(body);
			assert_eq!(decoded.text, body);
			assert!(decoded.tags.is_empty());
			assert_eq!(decoded.capture_time, None);
		}
	}

	#[test]
	fn round_trips() {
		let time = Utc.with_ymd_and_hms(2023, 6, 1, 8, 0, 5).unwrap();
		let cases = [
			(None, tags(&[]), "hello"),
			(Some(time), tags(&[]), "hello"),
			(None, tags(&["cafe", "quiet"]), "  indented text"),
			(Some(time), tags(&["night view"]), "\nstarts with newline"),
			(Some(time), tags(&["a"]), ""),
		];

		for (capture_time, tags, text) in cases {
			let body = encode(capture_time, &tags, text);
			assert_eq!(decode(&body), PostContent::new(capture_time, tags, text));
		}
	}

	#[test]
	fn unterminated_marker_falls_back_to_plain_text() {
		for body in [
			"[PHOTO_TIME:2024-01-15T10:30:00Z no end",
			"[TAGS:a · b",
			"[PHOTO_TIME:2024-01-15T10:30:00Z][TAGS:a",
		] {
			assert_eq!(decode(body), PostContent::new(None, Vec::new(), body));
		}
	}

	#[test]
	fn invalid_time_payload_keeps_parsing() {
		let decoded = decode("[PHOTO_TIME:yesterday][TAGS: a ·  · b ]\nbody");

		assert_eq!(decoded.capture_time, None);
		assert_eq!(decoded.tags, tags(&["a", "b"]));
		assert_eq!(decoded.text, "body");
	}

	#[test]
	fn tag_marker_must_follow_time_marker_directly() {
		let decoded = decode("[PHOTO_TIME:2024-01-15T10:30:00Z]\n[TAGS:a]");

		assert!(decoded.capture_time.is_some());
		assert!(decoded.tags.is_empty());
		assert_eq!(decoded.text, "[TAGS:a]");
	}

	#[test]
	fn encode_drops_blank_tags_and_terminators() {
		assert_eq!(
			encode(None, &tags(&[" ", "best]coffee"]), "x"),
			"[TAGS:bestcoffee]\nx"
		);
		assert_eq!(encode(None, &[], "x"), "x");
	}

	#[test]
	fn only_normalized_tags_survive_unchanged() {
		let body = encode(None, &tags(&["a]b", " padded ", "", "plain"]), "x");

		assert_eq!(decode(&body).tags, tags(&["ab", "padded", "plain"]));
	}
}
