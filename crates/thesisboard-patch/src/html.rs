//! Just enough HTML handling to patch a hand-written page by element id.
//!
//! The page is treated as text. An element is found by its `id` attribute
//! and its extent by balancing open and close tags of the same name, which
//! holds for the well-formed markup the dashboard is written in. Everything
//! outside the touched region is left byte for byte as it was.

/// Byte offsets of one element inside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Start of the opening tag (`<`).
    pub open_start: usize,
    /// First byte after the opening tag's `>`.
    pub inner_start: usize,
    /// Start of the closing tag.
    pub inner_end: usize,
    /// First byte after the closing tag.
    pub close_end: usize,
}

impl Region {
    pub fn inner<'a>(&self, html: &'a str) -> &'a str {
        &html[self.inner_start..self.inner_end]
    }
}

/// Locate the element whose `id` attribute equals `id`.
pub fn find_by_id(html: &str, id: &str) -> Option<Region> {
    for quote in ['"', '\''] {
        let needle = format!("id={quote}{id}{quote}");
        let mut from = 0;
        while let Some(found) = html[from..].find(&needle) {
            let at = from + found;
            from = at + needle.len();
            // `data-id="x"` must not match `id="x"`.
            if !html[..at].ends_with(|c: char| c.is_ascii_whitespace()) {
                continue;
            }
            if let Some(region) = element_around(html, at) {
                return Some(region);
            }
        }
    }
    None
}

/// Given an offset inside an opening tag, find the whole element.
fn element_around(html: &str, attr_at: usize) -> Option<Region> {
    let open_start = html[..attr_at].rfind('<')?;
    // A `>` between the `<` and the attribute means we are not inside a tag.
    if html[open_start..attr_at].contains('>') {
        return None;
    }
    let name: String = html[open_start + 1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if name.is_empty() {
        return None;
    }
    let inner_start = attr_at + html[attr_at..].find('>')? + 1;
    if html[..inner_start].ends_with("/>") {
        return None;
    }

    let open_tag = format!("<{name}");
    let close_tag = format!("</{name}");
    let mut depth = 1usize;
    let mut pos = inner_start;
    loop {
        let next_open = find_tag(html, pos, &open_tag);
        let next_close = find_tag(html, pos, &close_tag)?;
        match next_open {
            Some(o) if o < next_close => {
                depth += 1;
                pos = o + open_tag.len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    let close_end = next_close + html[next_close..].find('>')? + 1;
                    return Some(Region {
                        open_start,
                        inner_start,
                        inner_end: next_close,
                        close_end,
                    });
                }
                pos = next_close + close_tag.len();
            }
        }
    }
}

/// Next occurrence of `<name` or `</name` that is a whole tag name, not a prefix
/// (`<p` must not match `<pre`).
fn find_tag(html: &str, from: usize, tag: &str) -> Option<usize> {
    let mut pos = from;
    while let Some(found) = html[pos..].find(tag) {
        let at = pos + found;
        let after = html[at + tag.len()..].chars().next();
        match after {
            Some(c) if c.is_ascii_whitespace() || c == '>' || c == '/' => return Some(at),
            _ => pos = at + tag.len(),
        }
    }
    None
}

/// Every element carrying `class` among its classes, in document order.
pub fn find_by_class(html: &str, class: &str) -> Vec<Region> {
    attributes(html, "class")
        .into_iter()
        .filter(|(_, value)| value.split_ascii_whitespace().any(|c| c == class))
        .filter_map(|(at, _)| element_around(html, at))
        .collect()
}

/// Decoded values of every `name` attribute, in document order.
pub fn attribute_values(html: &str, name: &str) -> Vec<String> {
    attributes(html, name)
        .into_iter()
        .map(|(_, value)| unescape(value))
        .collect()
}

/// Quoted `name=` attributes as (offset of the name, raw value).
fn attributes<'a>(html: &'a str, name: &str) -> Vec<(usize, &'a str)> {
    let needle = format!("{name}=");
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(i) = html[from..].find(&needle) {
        let at = from + i;
        let value_at = at + needle.len();
        from = value_at;
        // `data-class=` is not `class=`.
        if !html[..at].ends_with(|c: char| c.is_ascii_whitespace()) {
            continue;
        }
        let quote = html[value_at..].chars().next();
        let Some(quote) = quote.filter(|c| matches!(*c, '"' | '\'')) else {
            continue;
        };
        let body = value_at + 1;
        let Some(len) = html[body..].find(quote) else {
            break;
        };
        found.push((at, &html[body..body + len]));
        from = body + len + 1;
    }
    found
}

/// Replace an element's content, keeping its tags.
pub fn replace_inner(html: &str, region: Region, content: &str) -> String {
    let mut out = String::with_capacity(html.len() + content.len());
    out.push_str(&html[..region.inner_start]);
    out.push_str(content);
    out.push_str(&html[region.inner_end..]);
    out
}

/// Insert `fragment` as the element's first child.
pub fn prepend_child(html: &str, region: Region, fragment: &str) -> String {
    let mut out = String::with_capacity(html.len() + fragment.len());
    out.push_str(&html[..region.inner_start]);
    out.push_str(fragment);
    out.push_str(&html[region.inner_start..]);
    out
}

/// Text content of a fragment: tags dropped, entities decoded.
pub fn text_content(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    unescape(&text)
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
