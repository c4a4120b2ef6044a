//! Rendering of resolution results.

use chrono::DateTime;
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use care_ingest::{HeaderMapping, MatchKind};
use care_model::PatientSummary;
use care_resolve::ResolutionStats;

/// One row per patient summary.
pub fn summary_table(summaries: &[PatientSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Key"),
        header_cell("Name"),
        header_cell("Gender"),
        header_cell("Records"),
        header_cell("Admissions"),
        header_cell("First"),
        header_cell("Latest"),
        header_cell("Hospital"),
        header_cell("Diagnosis"),
        header_cell("Caregivers"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Center);
    align_column(&mut table, 6, CellAlignment::Center);

    let mut total_records = 0usize;
    let mut total_admissions = 0usize;
    for summary in summaries {
        total_records += summary.member_count;
        total_admissions += summary.admission_count;
        table.add_row(vec![
            Cell::new(&summary.key).fg(Color::Cyan),
            Cell::new(&summary.patient_name),
            text_cell(&summary.gender),
            Cell::new(summary.member_count),
            count_cell(summary.admission_count),
            date_cell(summary.first_admission_at),
            date_cell(summary.latest_admission_at),
            text_cell(&summary.latest_hospital),
            text_cell(&summary.latest_diagnosis),
            text_cell(&summary.caregivers),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{} patients", summaries.len())).add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(total_records).add_attribute(Attribute::Bold),
        Cell::new(total_admissions).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    table
}

/// Counters of one resolution pass.
pub fn stats_table(stats: &ResolutionStats) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Stage"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let rows = [
        ("Records seen", stats.records_seen),
        ("Dropped (no name)", stats.records_dropped),
        ("Matched by identity number", stats.id_matches),
        ("Matched by name and evidence", stats.name_matches),
        ("Matched by record key", stats.key_matches),
        ("Groups created", stats.groups_created),
        ("Re-keyed to identity number", stats.rekeys),
    ];
    for (label, count) in rows {
        table.add_row(vec![Cell::new(label), count_cell(count)]);
    }
    table
}

/// Header-to-field report for `inspect`.
pub fn mapping_table(mapping: &HeaderMapping) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Header"),
        header_cell("Field"),
        header_cell("Match"),
        header_cell("Score"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for found in &mapping.matches {
        let kind = match found.kind {
            MatchKind::Exact => Cell::new("exact").fg(Color::Green),
            MatchKind::Fuzzy => Cell::new("fuzzy").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(found.column + 1),
            Cell::new(&found.header),
            Cell::new(found.field.as_str()),
            kind,
            Cell::new(format!("{:.3}", found.score)),
        ]);
    }
    for header in &mapping.unmapped {
        table.add_row(vec![
            dim_cell("-"),
            Cell::new(header),
            Cell::new("unmapped").fg(Color::Red),
            dim_cell("-"),
            dim_cell("-"),
        ]);
    }
    table
}

/// One `key | name | records | admissions` line per patient.
pub fn key_listing(summaries: &[PatientSummary]) -> String {
    summaries
        .iter()
        .map(|summary| {
            format!(
                "{} | {} | {} | {}",
                summary.key, summary.patient_name, summary.member_count, summary.admission_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Epoch milliseconds as a UTC calendar date.
pub fn format_millis(millis: Option<i64>) -> Option<String> {
    millis
        .and_then(DateTime::from_timestamp_millis)
        .map(|instant| instant.format("%Y-%m-%d").to_string())
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(165);
    table.set_constraints(vec![
        ColumnConstraint::UpperBoundary(Width::Fixed(22)),
        ColumnConstraint::UpperBoundary(Width::Fixed(16)),
        ColumnConstraint::LowerBoundary(Width::Fixed(6)),
        ColumnConstraint::LowerBoundary(Width::Fixed(7)),
        ColumnConstraint::LowerBoundary(Width::Fixed(10)),
        ColumnConstraint::LowerBoundary(Width::Fixed(12)),
        ColumnConstraint::LowerBoundary(Width::Fixed(12)),
        ColumnConstraint::UpperBoundary(Width::Percentage(20)),
        ColumnConstraint::UpperBoundary(Width::Percentage(25)),
        ColumnConstraint::UpperBoundary(Width::Percentage(15)),
    ]);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn text_cell(value: &str) -> Cell {
    if value.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(value)
    }
}

fn date_cell(millis: Option<i64>) -> Cell {
    match format_millis(millis) {
        Some(date) => Cell::new(date),
        None => dim_cell("-"),
    }
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_render_in_utc() {
        assert_eq!(format_millis(Some(19_362 * 86_400_000)).as_deref(), Some("2023-01-05"));
        assert_eq!(format_millis(None), None);
    }
}
