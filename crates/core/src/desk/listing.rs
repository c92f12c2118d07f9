//! Markup adapter for the ticket listing page.
//!
//! Columns are positional (0-indexed):
//!
//! | idx | field         | source                                   |
//! |-----|---------------|------------------------------------------|
//! | 1   | id            | cell text                                |
//! | 2   | updated_at    | cell text                                |
//! | 3   | assigned_name | cell text                                |
//! | 4   | subject       | `a.link` text                            |
//! | 5   | status        | `span` text                              |
//! | 6   | room          | cell text                                |
//! | 7   | priority      | `.dropdown.priority .label span` text    |
//! | 7   | priority_code | `.dropdown.priority` `data-value`        |
//!
//! Nothing else in the crate knows about this layout.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::filter::FilterSpec;

use super::TicketRecord;

pub const NO_SUBJECT: &str = "Sans sujet";
pub const UNKNOWN_STATUS: &str = "Inconnu";
pub const UNDEFINED_PRIORITY: &str = "Non définie";
pub const UNKNOWN_PRIORITY_CODE: &str = "unknown";

const COL_ID: usize = 1;
const COL_UPDATED: usize = 2;
const COL_NAME: usize = 3;
const COL_SUBJECT: usize = 4;
const COL_STATUS: usize = 5;
const COL_ROOM: usize = 6;
const COL_PRIORITY: usize = 7;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static ROWS: Lazy<Selector> = Lazy::new(|| selector("table.ticket-list tbody tr"));
static SUBJECT_LINK: Lazy<Selector> = Lazy::new(|| selector("a.link"));
static STATUS_SPAN: Lazy<Selector> = Lazy::new(|| selector("span"));
static PRIORITY_WIDGET: Lazy<Selector> = Lazy::new(|| selector(".dropdown.priority"));
static PRIORITY_LABEL: Lazy<Selector> = Lazy::new(|| selector(".label span"));

/// Parse every ticket row of a listing page.
pub fn parse_listing_page(html: &str) -> Vec<TicketRecord> {
    extract_tickets(html, &FilterSpec::default())
}

/// Parse a listing page, keeping only tickets matching `filter`.
///
/// Rows are filtered as they are parsed. A page without the ticket table
/// yields an empty list.
pub fn extract_tickets(html: &str, filter: &FilterSpec) -> Vec<TicketRecord> {
    let document = Html::parse_document(html);

    document
        .select(&ROWS)
        .filter_map(|row| parse_row(&row))
        .filter(|ticket| filter.matches(ticket))
        .collect()
}

/// Build a ticket from one row, or `None` when the row has no id.
fn parse_row(row: &ElementRef<'_>) -> Option<TicketRecord> {
    let cells: Vec<ElementRef<'_>> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect();

    let id = cells.get(COL_ID).map(cell_text).unwrap_or_default();
    if id.is_empty() {
        return None;
    }

    let priority_widget = cells
        .get(COL_PRIORITY)
        .and_then(|cell| cell.select(&PRIORITY_WIDGET).next());

    let subject = nested_text(cells.get(COL_SUBJECT), &SUBJECT_LINK);
    let status = nested_text(cells.get(COL_STATUS), &STATUS_SPAN);
    let priority = priority_widget
        .and_then(|widget| widget.select(&PRIORITY_LABEL).next())
        .map(|label| cell_text(&label))
        .unwrap_or_default();
    let priority_code = priority_widget
        .and_then(|widget| widget.value().attr("data-value"))
        .map(|code| code.trim().to_string())
        .unwrap_or_default();

    Some(TicketRecord {
        id,
        subject: or_fallback(subject, NO_SUBJECT),
        status: or_fallback(status, UNKNOWN_STATUS),
        priority: or_fallback(priority, UNDEFINED_PRIORITY),
        priority_code: or_fallback(priority_code, UNKNOWN_PRIORITY_CODE),
        category: String::new(),
        room: cells.get(COL_ROOM).map(cell_text).unwrap_or_default(),
        assigned_name: cells.get(COL_NAME).map(cell_text).unwrap_or_default(),
        updated_at: cells.get(COL_UPDATED).map(cell_text).unwrap_or_default(),
        created_at: String::new(),
        owner: String::new(),
    })
}

fn cell_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn nested_text(cell: Option<&ElementRef<'_>>, selector: &Selector) -> String {
    cell.and_then(|cell| cell.select(selector).next())
        .map(|el| cell_text(&el))
        .unwrap_or_default()
}

fn or_fallback(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
