//! WCAG 2.2 success-criterion reference data.
//!
//! Static and immutable; criteria are looked up by dotted id.

use crate::models::{Criterion, WcagLevel};

const UNDERSTANDING: &str = "https://www.w3.org/WAI/WCAG22/Understanding/";
const QUICKREF: &str = "https://www.w3.org/WAI/WCAG22/quickref/";

/// Id of the sentinel criterion returned for unmatched rules.
pub const UNCLASSIFIED_ID: &str = "unclassified";

struct Entry {
    id: &'static str,
    title: &'static str,
    level: WcagLevel,
    slug: &'static str,
    expected: &'static str,
}

const CATALOG: &[Entry] = &[
    Entry { id: "1.1.1", title: "Non-text Content", level: WcagLevel::A, slug: "non-text-content",
        expected: "Every image, icon and non-text control has a text alternative that serves the same purpose." },
    Entry { id: "1.2.1", title: "Audio-only and Video-only (Prerecorded)", level: WcagLevel::A, slug: "audio-only-and-video-only-prerecorded",
        expected: "Prerecorded audio-only and video-only media have an equivalent transcript or audio track." },
    Entry { id: "1.2.2", title: "Captions (Prerecorded)", level: WcagLevel::A, slug: "captions-prerecorded",
        expected: "Prerecorded video with audio provides synchronized captions." },
    Entry { id: "1.3.1", title: "Info and Relationships", level: WcagLevel::A, slug: "info-and-relationships",
        expected: "Structure conveyed visually (headings, lists, tables, regions) is also exposed in markup." },
    Entry { id: "1.3.5", title: "Identify Input Purpose", level: WcagLevel::AA, slug: "identify-input-purpose",
        expected: "Inputs collecting user data declare their purpose with a valid autocomplete token." },
    Entry { id: "1.4.1", title: "Use of Color", level: WcagLevel::A, slug: "use-of-color",
        expected: "Color is never the only means of conveying information, such as distinguishing links from text." },
    Entry { id: "1.4.3", title: "Contrast (Minimum)", level: WcagLevel::AA, slug: "contrast-minimum",
        expected: "Text has a contrast ratio of at least 4.5:1, or 3:1 for large text." },
    Entry { id: "1.4.4", title: "Resize Text", level: WcagLevel::AA, slug: "resize-text",
        expected: "Text can be zoomed to 200% without loss of content; viewport scaling is not disabled." },
    Entry { id: "1.4.6", title: "Contrast (Enhanced)", level: WcagLevel::AAA, slug: "contrast-enhanced",
        expected: "Text has a contrast ratio of at least 7:1, or 4.5:1 for large text." },
    Entry { id: "1.4.10", title: "Reflow", level: WcagLevel::AA, slug: "reflow",
        expected: "Content reflows to a 320px wide viewport without two-dimensional scrolling." },
    Entry { id: "1.4.11", title: "Non-text Contrast", level: WcagLevel::AA, slug: "non-text-contrast",
        expected: "UI components and meaningful graphics have a contrast ratio of at least 3:1." },
    Entry { id: "1.4.12", title: "Text Spacing", level: WcagLevel::AA, slug: "text-spacing",
        expected: "Content stays readable when users override line, paragraph, letter and word spacing." },
    Entry { id: "2.1.1", title: "Keyboard", level: WcagLevel::A, slug: "keyboard",
        expected: "All functionality is operable through a keyboard interface." },
    Entry { id: "2.1.2", title: "No Keyboard Trap", level: WcagLevel::A, slug: "no-keyboard-trap",
        expected: "Keyboard focus can always be moved away from any component using the keyboard alone." },
    Entry { id: "2.2.1", title: "Timing Adjustable", level: WcagLevel::A, slug: "timing-adjustable",
        expected: "Time limits, including automatic refreshes and redirects, can be turned off, adjusted or extended." },
    Entry { id: "2.2.2", title: "Pause, Stop, Hide", level: WcagLevel::A, slug: "pause-stop-hide",
        expected: "Moving, blinking or scrolling content can be paused, stopped or hidden." },
    Entry { id: "2.4.1", title: "Bypass Blocks", level: WcagLevel::A, slug: "bypass-blocks",
        expected: "A mechanism such as a skip link or landmarks lets users bypass repeated blocks." },
    Entry { id: "2.4.2", title: "Page Titled", level: WcagLevel::A, slug: "page-titled",
        expected: "Each page has a title that describes its topic or purpose." },
    Entry { id: "2.4.3", title: "Focus Order", level: WcagLevel::A, slug: "focus-order",
        expected: "Focus moves through content in an order that preserves meaning and operability." },
    Entry { id: "2.4.4", title: "Link Purpose (In Context)", level: WcagLevel::A, slug: "link-purpose-in-context",
        expected: "The purpose of each link can be determined from its text or its context." },
    Entry { id: "2.4.6", title: "Headings and Labels", level: WcagLevel::AA, slug: "headings-and-labels",
        expected: "Headings and labels describe the topic or purpose of their content." },
    Entry { id: "2.4.7", title: "Focus Visible", level: WcagLevel::AA, slug: "focus-visible",
        expected: "Every keyboard-operable element shows a visible focus indicator." },
    Entry { id: "2.4.9", title: "Link Purpose (Link Only)", level: WcagLevel::AAA, slug: "link-purpose-link-only",
        expected: "The purpose of each link can be identified from the link text alone." },
    Entry { id: "2.5.3", title: "Label in Name", level: WcagLevel::A, slug: "label-in-name",
        expected: "The accessible name of a control contains the text of its visible label." },
    Entry { id: "2.5.8", title: "Target Size (Minimum)", level: WcagLevel::AA, slug: "target-size-minimum",
        expected: "Pointer targets are at least 24 by 24 CSS pixels or have sufficient spacing." },
    Entry { id: "3.1.1", title: "Language of Page", level: WcagLevel::A, slug: "language-of-page",
        expected: "The default human language of each page is declared with a valid lang attribute." },
    Entry { id: "3.1.2", title: "Language of Parts", level: WcagLevel::AA, slug: "language-of-parts",
        expected: "Passages in a different language declare that language with a valid lang attribute." },
    Entry { id: "3.2.2", title: "On Input", level: WcagLevel::A, slug: "on-input",
        expected: "Changing a form control setting does not trigger an unexpected change of context." },
    Entry { id: "3.3.1", title: "Error Identification", level: WcagLevel::A, slug: "error-identification",
        expected: "Input errors are detected, the field in error is identified, and the error is described in text." },
    Entry { id: "3.3.2", title: "Labels or Instructions", level: WcagLevel::A, slug: "labels-or-instructions",
        expected: "Form fields provide labels or instructions when user input is required." },
    Entry { id: "4.1.1", title: "Parsing", level: WcagLevel::A, slug: "parsing",
        expected: "Markup has no duplicate ids or malformed elements that break assistive technologies." },
    Entry { id: "4.1.2", title: "Name, Role, Value", level: WcagLevel::A, slug: "name-role-value",
        expected: "Every UI component exposes an accessible name, role, and current state or value." },
    Entry { id: "4.1.3", title: "Status Messages", level: WcagLevel::AA, slug: "status-messages",
        expected: "Status messages are announced by assistive technologies without receiving focus." },
];

impl Entry {
    fn to_criterion(&self) -> Criterion {
        Criterion {
            id: self.id.to_string(),
            title: self.title.to_string(),
            level: Some(self.level),
            expected_behavior: self.expected.to_string(),
            reference_url: format!("{}{}", UNDERSTANDING, self.slug),
        }
    }
}

/// Catalog entry for a dotted criterion id.
pub fn lookup_criterion(id: &str) -> Option<Criterion> {
    CATALOG.iter().find(|e| e.id == id).map(Entry::to_criterion)
}

/// Catalog entry, or a minimal record for a valid id the catalog lacks.
pub fn criterion_or_generic(id: &str) -> Criterion {
    lookup_criterion(id).unwrap_or_else(|| Criterion {
        id: id.to_string(),
        title: format!("WCAG {}", id),
        level: None,
        expected_behavior: format!("Content conforms to WCAG success criterion {}.", id),
        reference_url: QUICKREF.to_string(),
    })
}

/// Sentinel criterion for findings no rule could classify.
pub fn unclassified() -> Criterion {
    Criterion {
        id: UNCLASSIFIED_ID.to_string(),
        title: "Unclassified".to_string(),
        level: None,
        expected_behavior:
            "Content is perceivable, operable, understandable and robust for all users; review this finding manually."
                .to_string(),
        reference_url: QUICKREF.to_string(),
    }
}

/// Every criterion id in the catalog, in document order.
pub fn catalog_ids() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|e| e.id)
}
