use thesisboard_core::{OpinionDocument, Probabilities, StateBlob, title_key};
use thesisboard_store::EventHistory;
use tracing::{debug, info, warn};

use crate::category::category_key;
use crate::html::{self, find_by_id};
use crate::timeline::{TIMELINE_CONTAINER_ID, on_page, render_event};

/// Leading characters compared when deciding whether narrative text changed.
const NARRATIVE_PREFIX_LEN: usize = 80;

/// Result of applying one opinion. Nothing has been written yet.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub state: StateBlob,
    pub page: String,
    /// One line per change, in the order applied.
    pub audit: Vec<String>,
    /// Title keys of the timeline events inserted, to add to the history.
    pub new_keys: Vec<String>,
}

impl PatchOutcome {
    pub fn change_count(&self) -> usize {
        self.audit.len()
    }
}

/// Apply `doc` to copies of `state` and `page`.
///
/// Values equal to what is already there are skipped silently, so applying
/// the same document twice changes nothing the second time.
pub fn apply(
    doc: &OpinionDocument,
    state: &StateBlob,
    page: &str,
    history: &EventHistory,
) -> PatchOutcome {
    let mut state = state.clone();
    let mut page = page.to_string();
    let mut audit = Vec::new();

    apply_editorial(doc, &mut state, &mut audit);
    apply_narrative(doc, &mut state, &mut page, &mut audit);
    let new_keys = apply_timeline(doc, &mut page, history, &mut audit);

    info!(changes = audit.len(), new_events = new_keys.len(), "opinion applied in memory");
    PatchOutcome {
        state,
        page,
        audit,
        new_keys,
    }
}

fn apply_editorial(doc: &OpinionDocument, state: &mut StateBlob, audit: &mut Vec<String>) {
    let editorial = &mut state.editorial;

    if let Some(new) = doc.overall_status
        && editorial.overall_status != Some(new)
    {
        audit.push(format!(
            "overall_status: {} -> {}",
            editorial.overall_status.map_or("none", |s| s.as_str()),
            new.as_str()
        ));
        editorial.overall_status = Some(new);
    }

    if let Some(new) = doc.thesis_score
        && editorial.thesis_score != Some(new)
    {
        audit.push(format!(
            "thesis_score: {} -> {new}",
            editorial
                .thesis_score
                .map_or_else(|| "none".to_string(), |s| s.to_string())
        ));
        editorial.thesis_score = Some(new);
    }

    if let Some(new) = doc.probabilities
        && editorial.probabilities != Some(new)
    {
        audit.push(format!(
            "probabilities: {} -> {}",
            editorial
                .probabilities
                .as_ref()
                .map_or_else(|| "none".to_string(), format_probabilities),
            format_probabilities(&new)
        ));
        editorial.probabilities = Some(new);
    }

    for delta in &doc.scorecard {
        let Some(key) = category_key(&delta.category) else {
            warn!(category = %delta.category, "unmapped scorecard category, skipped");
            continue;
        };
        let current = editorial.scorecard.get(key).copied();
        if current == Some(delta.recommended_status) {
            continue;
        }
        let mut line = format!(
            "scorecard.{key}: {} -> {}",
            current.map_or("none", |s| s.as_str()),
            delta.recommended_status.as_str()
        );
        if !delta.reasoning.trim().is_empty() {
            line.push_str(&format!(" ({})", delta.reasoning.trim()));
        }
        audit.push(line);
        editorial
            .scorecard
            .insert(key.to_string(), delta.recommended_status);
    }
}

fn format_probabilities(p: &Probabilities) -> String {
    format!("{}/{}/{}/{}", p.bull, p.base, p.bear, p.tail)
}

fn apply_narrative(
    doc: &OpinionDocument,
    state: &mut StateBlob,
    page: &mut String,
    audit: &mut Vec<String>,
) {
    for (id, text) in &doc.narrative {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let Some(region) = find_by_id(page, id) else {
            warn!(%id, "narrative region not found on page, skipped");
            continue;
        };
        let existing = html::text_content(region.inner(page));
        if prefix_key(&existing) == prefix_key(text) {
            debug!(%id, "narrative unchanged");
            continue;
        }
        *page = html::replace_inner(page, region, &html::escape(text));
        state
            .editorial
            .narrative
            .insert(id.clone(), text.to_string());
        audit.push(format!("narrative.{id}: updated"));
    }
}

/// Whitespace-collapsed, lowercased leading characters.
fn prefix_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .flat_map(char::to_lowercase)
        .take(NARRATIVE_PREFIX_LEN)
        .collect()
}

fn apply_timeline(
    doc: &OpinionDocument,
    page: &mut String,
    history: &EventHistory,
    audit: &mut Vec<String>,
) -> Vec<String> {
    let mut new_keys: Vec<String> = Vec::new();
    if doc.timeline_events.is_empty() {
        return new_keys;
    }
    if find_by_id(page, TIMELINE_CONTAINER_ID).is_none() {
        warn!(
            container = TIMELINE_CONTAINER_ID,
            events = doc.timeline_events.len(),
            "timeline container not found on page, events skipped"
        );
        return new_keys;
    }

    // Each insert goes to the top, so walk backwards to keep document order.
    for event in doc.timeline_events.iter().rev() {
        let key = title_key(&event.title);
        if key.is_empty() {
            continue;
        }
        if history.contains(&key)
            || new_keys.contains(&key)
            || on_page(page, &key, &event.title)
        {
            debug!(%key, "timeline event already recorded");
            continue;
        }
        let Some(container) = find_by_id(page, TIMELINE_CONTAINER_ID) else {
            break;
        };
        *page = html::prepend_child(page, container, &render_event(event, &key));
        audit.push(format!("timeline: {} {}", event.date, event.title.trim()));
        new_keys.push(key);
    }
    new_keys
}
