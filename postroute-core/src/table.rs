//! Tabular summary of a [`RouteResult`] for the presentation layer.

use std::fmt::Write as _;

use crate::{LegOutcome, RouteLeg, RouteResult};

/// Text shown for unknown attributes.
pub const NOT_AVAILABLE: &str = "N/A";
/// Address cell of a leg that could not be routed.
pub const ROUTE_NOT_AVAILABLE: &str = "Route not available";
/// Label of the closing row of a round-trip table.
pub const TOTAL_ROW_LABEL: &str = "TOTAL ROUND TRIP DISTANCE";

const DESTINATION_HEADERS: [&str; 6] = ["From", "To", "Address", "City", "Postcode", "Length (m)"];
const ROUND_TRIP_HEADERS: [&str; 5] = ["From", "To", "Address", "City", "Length (m)"];

/// Which columns a table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// Single or fan-out query: one row per destination.
    Destinations,
    /// Round trip: one row per leg plus a total row.
    RoundTrip,
}

/// One row of a [`RouteTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Origin label.
    pub from: String,
    /// Destination label.
    pub to: String,
    /// Destination address.
    pub address: String,
    /// Destination city.
    pub city: String,
    /// Destination postcode.
    pub postcode: String,
    /// Length in metres, rounded to two decimals.
    pub length_m: f64,
}

/// Rows and optional total derived from a route result.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use postroute_core::test_support::{StubPathSolver, sample_dataset};
/// use postroute_core::{
///     LocationQuery, MemoryRouteStore, OrchestratorConfig, RouteOrchestrator, RouteTable,
/// };
///
/// let orchestrator = RouteOrchestrator::new(
///     Arc::new(sample_dataset()),
///     MemoryRouteStore::default(),
///     Some(StubPathSolver::default()),
///     OrchestratorConfig::default(),
/// )?;
/// let start: LocationQuery = "400001".parse()?;
/// let result = orchestrator.route_round_trip(&start, &["400002".parse()?])?;
///
/// let table = RouteTable::from_result(&result);
/// assert_eq!(table.rows.len(), 2);
/// assert!(table.to_html().contains("TOTAL ROUND TRIP DISTANCE"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTable {
    /// Column layout.
    pub layout: TableLayout,
    /// Rows in leg order.
    pub rows: Vec<TableRow>,
    /// Rounded total, present for round trips.
    pub total_m: Option<f64>,
}

impl RouteTable {
    /// Build the table for `result`.
    pub fn from_result(result: &RouteResult) -> Self {
        let layout = if result.is_roundtrip {
            TableLayout::RoundTrip
        } else {
            TableLayout::Destinations
        };
        let total_m = match layout {
            TableLayout::RoundTrip => Some(round2(
                result.total_distance_m.unwrap_or_else(|| result.sum_length_m()),
            )),
            TableLayout::Destinations => None,
        };
        Self {
            layout,
            rows: result.legs.iter().map(row_for).collect(),
            total_m,
        }
    }

    /// Column headers for the layout.
    pub fn headers(&self) -> &'static [&'static str] {
        match self.layout {
            TableLayout::Destinations => &DESTINATION_HEADERS,
            TableLayout::RoundTrip => &ROUND_TRIP_HEADERS,
        }
    }

    /// Cell text of `row` in header order.
    pub fn cells(&self, row: &TableRow) -> Vec<String> {
        let mut cells = vec![
            row.from.clone(),
            row.to.clone(),
            row.address.clone(),
            row.city.clone(),
        ];
        if self.layout == TableLayout::Destinations {
            cells.push(row.postcode.clone());
        }
        cells.push(format_length(row.length_m));
        cells
    }

    /// Render as an HTML table with escaped cell text.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<table><thead><tr>");
        for header in self.headers() {
            let _ = write!(html, "<th>{}</th>", escape_html(header));
        }
        html.push_str("</tr></thead><tbody>");
        for row in &self.rows {
            html.push_str("<tr>");
            for cell in self.cells(row) {
                let _ = write!(html, "<td>{}</td>", escape_html(&cell));
            }
            html.push_str("</tr>");
        }
        if let Some(total) = self.total_m {
            let _ = write!(
                html,
                "<tr class=\"total\"><td colspan=\"{}\">{TOTAL_ROW_LABEL}</td><td>{}</td></tr>",
                self.headers().len() - 1,
                format_length(total)
            );
        }
        html.push_str("</tbody></table>");
        html
    }
}

fn row_for(leg: &RouteLeg) -> TableRow {
    match &leg.outcome {
        LegOutcome::Routed(segment) => TableRow {
            from: leg.from_label.clone(),
            to: leg.to_label.clone(),
            address: segment.to.address().unwrap_or(NOT_AVAILABLE).to_owned(),
            city: segment.to.city().unwrap_or(NOT_AVAILABLE).to_owned(),
            postcode: segment.to.postcode().unwrap_or(NOT_AVAILABLE).to_owned(),
            length_m: round2(segment.length_m),
        },
        LegOutcome::Unresolved(_) => TableRow {
            from: leg.from_label.clone(),
            to: leg.to_label.clone(),
            address: ROUTE_NOT_AVAILABLE.to_owned(),
            city: NOT_AVAILABLE.to_owned(),
            postcode: leg.to_label.clone(),
            length_m: 0.0,
        },
    }
}

/// Round metres to two decimal places.
pub fn round2(metres: f64) -> f64 {
    (metres * 100.0).round() / 100.0
}

fn format_length(metres: f64) -> String {
    format!("{metres:.2}")
}

/// Escape text for inclusion in HTML element content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
