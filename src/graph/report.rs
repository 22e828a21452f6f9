//! Line classification for the analyzer's structure report.
//!
//! The analyzer tags each line with a marker (an emoji glyph, a keyword such
//! as `Class:`, or both). Markers are matched by what they mean, so
//! `📦 App: blog`, `App: blog` and `📦 blog` all declare the same app.

/// A recognized report line, borrowing from the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportLine<'a> {
	App(&'a str),
	File(&'a str),
	Class {
		name: &'a str,
		line: Option<u32>,
	},
	/// Function or method; which one depends on indentation under a class.
	Member {
		name: &'a str,
		line: Option<u32>,
	},
	Route {
		pattern: &'a str,
		target: &'a str,
		line: Option<u32>,
	},
}

/// A recognized line plus the width of its leading whitespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classified<'a> {
	pub indent: usize,
	pub line: ReportLine<'a>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Marker {
	App,
	File,
	Class,
	Member,
	Route,
}

const TAB_WIDTH: usize = 4;

fn glyph_marker(c: char) -> Option<Marker> {
	match c {
		'📦' => Some(Marker::App),
		'📄' | '📁' => Some(Marker::File),
		'🏛' | '🔷' => Some(Marker::Class),
		'🔹' | '🔸' | '⚙' => Some(Marker::Member),
		'🔗' | '🌐' => Some(Marker::Route),
		_ => None,
	}
}

fn keyword_marker(word: &str) -> Option<Marker> {
	match word.to_ascii_lowercase().as_str() {
		"app" => Some(Marker::App),
		"file" => Some(Marker::File),
		"class" => Some(Marker::Class),
		"method" | "function" | "def" | "async" => Some(Marker::Member),
		"url" | "route" | "path" => Some(Marker::Route),
		_ => None,
	}
}

fn indent_width(raw: &str) -> usize {
	raw.chars()
		.take_while(|c| c.is_whitespace())
		.map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
		.sum()
}

/// Splits a leading run of non-ASCII symbols (emoji, variation selectors)
/// off the line and reports the first one that names a marker.
fn split_glyphs(text: &str) -> (Option<Marker>, &str) {
	let end = text
		.char_indices()
		.find(|&(_, c)| c.is_ascii() && !c.is_whitespace())
		.map_or(text.len(), |(i, _)| i);
	let (glyphs, rest) = text.split_at(end);
	if glyphs.chars().any(char::is_alphanumeric) {
		return (None, text);
	}
	(glyphs.chars().find_map(glyph_marker), rest)
}

/// Reads a leading keyword. With a glyph present only the `Keyword:` form
/// counts, so `📄 path utils.py` stays a file line.
fn split_keyword(text: &str, has_glyph: bool) -> Option<(Marker, &str)> {
	let end = text
		.find(|c: char| c == ':' || c.is_whitespace())
		.unwrap_or(text.len());
	let (word, rest) = text.split_at(end);
	let marker = keyword_marker(word)?;
	if let Some(value) = rest.strip_prefix(':') {
		return Some((marker, value.trim_start()));
	}
	if has_glyph || (!rest.is_empty() && !rest.starts_with(char::is_whitespace)) {
		return None;
	}
	Some((marker, rest.trim_start()))
}

/// Strips a trailing `(line N)` location suffix.
fn split_location(text: &str) -> (&str, Option<u32>) {
	let trimmed = text.trim_end();
	let Some(body) = trimmed.strip_suffix(')') else {
		return (trimmed, None);
	};
	let Some(pos) = body.rfind("(line ") else {
		return (trimmed, None);
	};
	match body[pos + "(line ".len()..].trim().parse::<u32>() {
		Ok(n) => (trimmed[..pos].trim_end(), Some(n)),
		Err(_) => (trimmed, None),
	}
}

fn declared_name(text: &str) -> &str {
	let text = text.trim();
	let text = text.strip_prefix("async ").map_or(text, str::trim_start);
	let text = text.strip_prefix("def ").map_or(text, str::trim_start);
	let end = text.find('(').unwrap_or(text.len());
	text[..end].trim().trim_end_matches(':').trim_end()
}

fn unquote(text: &str) -> &str {
	let text = text.trim();
	for q in ['"', '\''] {
		if let Some(inner) = text.strip_prefix(q).and_then(|t| t.strip_suffix(q)) {
			return inner;
		}
	}
	text
}

/// Classifies one raw report line. Blank, unrecognized and malformed lines
/// yield `None`.
pub fn classify(raw: &str) -> Option<Classified<'_>> {
	let trimmed = raw.trim();
	if trimmed.is_empty() {
		return None;
	}
	let (glyph, body) = split_glyphs(trimmed);
	let (marker, value) = match split_keyword(body, glyph.is_some()) {
		Some(found) => found,
		None => (glyph?, body),
	};

	let line = match marker {
		Marker::App => ReportLine::App(non_empty(value.trim())?),
		Marker::File => ReportLine::File(non_empty(value.trim())?),
		Marker::Class => {
			let (text, line) = split_location(value);
			ReportLine::Class {
				name: non_empty(declared_name(text))?,
				line,
			}
		}
		Marker::Member => {
			let (text, line) = split_location(value);
			// `async def` arrives here as `def name()` once `async` is the keyword.
			ReportLine::Member {
				name: non_empty(declared_name(text))?,
				line,
			}
		}
		Marker::Route => {
			let (text, line) = split_location(value);
			let mut parts = text.split("->");
			let (Some(pattern), Some(target), None) = (parts.next(), parts.next(), parts.next())
			else {
				return None;
			};
			ReportLine::Route {
				pattern: non_empty(unquote(pattern))?,
				target: non_empty(target.trim())?,
				line,
			}
		}
	};

	Some(Classified {
		indent: indent_width(raw),
		line,
	})
}

fn non_empty(s: &str) -> Option<&str> {
	(!s.is_empty()).then_some(s)
}

/// Final dotted segment of a target, without a trailing call suffix.
///
/// `blog.views.PostView.as_view()` yields `as_view`; scope and module path
/// are ignored entirely.
pub fn short_name(target: &str) -> &str {
	let target = target.trim();
	let callee = target.find('(').map_or(target, |i| &target[..i]);
	callee.rsplit('.').next().unwrap_or(callee).trim()
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn kind(raw: &str) -> Option<ReportLine<'_>> {
		classify(raw).map(|c| c.line)
	}

	#[test]
	fn glyph_and_keyword_forms_agree() {
		for raw in ["📦 App: blog", "App: blog", "📦 blog", "app blog"] {
			assert_eq!(kind(raw), Some(ReportLine::App("blog")), "{raw}");
		}
		assert_eq!(
			kind("📄 File: blog/views.py"),
			Some(ReportLine::File("blog/views.py"))
		);
		assert_eq!(kind("📄blog/views.py"), Some(ReportLine::File("blog/views.py")));
	}

	#[test]
	fn emoji_with_variation_selector_is_a_marker() {
		assert_eq!(
			kind("  🏛️ Class: PostView"),
			Some(ReportLine::Class {
				name: "PostView",
				line: None
			})
		);
	}

	#[test]
	fn class_bases_and_location_are_split_off() {
		assert_eq!(
			classify("  class PostView(View): (line 14)"),
			Some(Classified {
				indent: 2,
				line: ReportLine::Class {
					name: "PostView",
					line: Some(14)
				}
			})
		);
	}

	#[test]
	fn members_strip_call_parens_and_def_prefixes() {
		for raw in [
			"    🔹 Method: get()",
			"    def get(self, request)",
			"    🔹 async def get()",
			"    async def get():",
		] {
			assert_eq!(
				kind(raw),
				Some(ReportLine::Member {
					name: "get",
					line: None
				}),
				"{raw}"
			);
		}
		assert_eq!(
			kind("  🔸 Function: index() (line 3)"),
			Some(ReportLine::Member {
				name: "index",
				line: Some(3)
			})
		);
	}

	#[test]
	fn indentation_counts_tabs_wider() {
		assert_eq!(classify("\t🔹 get()").map(|c| c.indent), Some(4));
		assert_eq!(classify("   def get()").map(|c| c.indent), Some(3));
	}

	#[test]
	fn route_splits_pattern_and_target() {
		assert_eq!(
			kind(r#"  🔗 URL: "/posts/" -> blog.views.PostView.as_view() (line 7)"#),
			Some(ReportLine::Route {
				pattern: "/posts/",
				target: "blog.views.PostView.as_view()",
				line: Some(7)
			})
		);
		assert_eq!(
			kind("route '/a/b' -> app.views.Foo"),
			Some(ReportLine::Route {
				pattern: "/a/b",
				target: "app.views.Foo",
				line: None
			})
		);
	}

	#[test]
	fn malformed_routes_are_dropped() {
		assert_eq!(kind("🔗 /posts/"), None);
		assert_eq!(kind("🔗 /a -> b -> c"), None);
		assert_eq!(kind("URL: -> views.index"), None);
	}

	#[test]
	fn unrecognized_lines_are_ignored() {
		for raw in [
			"",
			"   ",
			"Django Project Structure",
			"Classes: 3",
			"✨ Scan complete",
			"application: blog",
		] {
			assert_eq!(kind(raw), None, "{raw}");
		}
	}

	#[test]
	fn bare_keyword_after_glyph_is_part_of_the_value() {
		assert_eq!(
			kind("📄 path utils.py"),
			Some(ReportLine::File("path utils.py"))
		);
	}

	#[test]
	fn short_name_is_last_segment_without_call() {
		assert_eq!(short_name("app.views.Foo"), "Foo");
		assert_eq!(short_name("blog.views.PostView.as_view()"), "as_view");
		assert_eq!(short_name("index"), "index");
		assert_eq!(short_name("include('blog.urls')"), "include");
	}
}
