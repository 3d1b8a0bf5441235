use thesisboard_core::{TimelineDraft, title_key};

use crate::html::{self, escape, find_by_id};

/// Id of the element timeline entries are inserted into, newest first.
pub const TIMELINE_CONTAINER_ID: &str = "timeline-events";

/// Markup for one timeline entry. `key` goes into `data-key` so later runs
/// can recognise the entry without the history file.
pub fn render_event(event: &TimelineDraft, key: &str) -> String {
    let mut out = format!(
        "\n<div class=\"timeline-event severity-{}\" data-key=\"{}\" data-category=\"{}\">\
         <span class=\"timeline-date\">{}</span>\
         <h4 class=\"timeline-title\">{}</h4>",
        event.severity.as_str(),
        escape(key),
        escape(&event.category),
        escape(&event.date),
        escape(&event.title),
    );
    if !event.expanded.trim().is_empty() {
        out.push_str(&format!(
            "<p class=\"timeline-detail\">{}</p>",
            escape(event.expanded.trim())
        ));
    }
    out.push_str("</div>");
    out
}

/// Whether the timeline container already holds this event: an entry with
/// the same `data-key`, or a `.timeline-title` whose normalized text matches.
/// Text elsewhere on the page does not count.
pub(crate) fn on_page(page: &str, key: &str, title: &str) -> bool {
    let Some(container) = find_by_id(page, TIMELINE_CONTAINER_ID) else {
        return false;
    };
    let events = container.inner(page);
    if html::attribute_values(events, "data-key").iter().any(|k| k == key) {
        return true;
    }
    let wanted = title_key(title);
    !wanted.is_empty()
        && html::find_by_class(events, "timeline-title")
            .iter()
            .any(|r| title_key(&html::text_content(r.inner(events))) == wanted)
}

#[cfg(test)]
mod tests {
    use thesisboard_core::Severity;

    use super::*;

    fn draft(title: &str) -> TimelineDraft {
        TimelineDraft {
            date: "2026-10-16".into(),
            category: "Regulatory Clarity".into(),
            severity: Severity::High,
            title: title.into(),
            expanded: String::new(),
        }
    }

    #[test]
    fn renders_escaped_markup() {
        let html = render_event(&draft("Court rules <finally> & clearly"), "courtrules");
        assert!(html.contains("data-key=\"courtrules\""));
        assert!(html.contains("severity-high"));
        assert!(html.contains("Court rules &lt;finally&gt; &amp; clearly"));
        assert!(!html.contains("timeline-detail"));
    }

    #[test]
    fn detail_paragraph_when_expanded() {
        let mut event = draft("x");
        event.expanded = " More context. ".into();
        assert!(render_event(&event, "x").contains("<p class=\"timeline-detail\">More context.</p>"));
    }

    fn page(events: &str) -> String {
        format!(
            r#"<table><tr><td>Tracker: Spot ETF Approval odds</td></tr></table>
<p>Bank &amp; broker launch is expected later.</p>
<div id="timeline-events">{events}</div>"#
        )
    }

    #[test]
    fn recognised_by_key_or_title() {
        let with_title = page(
            r#"<div class="timeline-event"><h4 class="timeline-title">Bank &amp; broker launch</h4></div>"#,
        );
        assert!(on_page(&with_title, "other", "Bank & broker launch"));
        assert!(on_page(&with_title, "other", "BANK & Broker launch!"));
        assert!(on_page(&page(r#"<div data-key="k1"></div>"#), "k1", "unrelated"));
        assert!(!on_page(&with_title, "k2", "Something new"));
    }

    #[test]
    fn text_outside_the_timeline_is_not_a_match() {
        let empty = page("");
        assert!(!on_page(&empty, &title_key("Spot ETF Approval"), "Spot ETF Approval"));
        assert!(!on_page(&empty, &title_key("Bank & broker launch"), "Bank & broker launch"));
    }

    #[test]
    fn longer_existing_title_is_not_a_match() {
        let existing = page(
            r#"<div data-key="spotetfapprovaldelayed"><h4 class="timeline-title">Spot ETF Approval Delayed</h4></div>"#,
        );
        assert!(!on_page(&existing, &title_key("Spot ETF Approval"), "Spot ETF Approval"));
    }

    #[test]
    fn no_container_means_nothing_recorded() {
        assert!(!on_page(r#"<div data-key="k1"></div>"#, "k1", "x"));
    }
}
