use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use fuzzmatch_cli::pipeline::{DatasetProfile, RunOutcome};

pub fn print_summary(outcome: &RunOutcome) {
    println!("Output: {} ({})", outcome.output.display(), outcome.format);

    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);

    table.add_row(vec![
        Cell::new(format!("{} rows", outcome.left_name)),
        Cell::new(outcome.left_rows),
    ]);
    table.add_row(vec![
        Cell::new(format!("{} rows", outcome.right_name)),
        Cell::new(outcome.right_rows),
    ]);
    table.add_row(vec![
        Cell::new("Rows written").add_attribute(Attribute::Bold),
        Cell::new(outcome.rows).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![Cell::new("Groups"), Cell::new(outcome.groups)]);
    table.add_row(vec![
        Cell::new("Mean score"),
        match outcome.mean_score {
            Some(mean) => Cell::new(format!("{mean:.2}")),
            None => dim_cell("N/A"),
        },
    ]);
    table.add_row(vec![
        Cell::new("Elapsed"),
        Cell::new(format!("{:.2}s", outcome.elapsed.as_secs_f64())),
    ]);
    println!("{table}");
}

pub fn print_profile(profile: &DatasetProfile) {
    println!("Dataset: {} ({} rows)", profile.name, profile.rows);
    if !profile.sheets.is_empty() {
        println!("Sheets: {}", profile.sheets.join(", "));
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Column"),
        header_cell("Present"),
        header_cell("Distinct"),
        header_cell("ID?"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);

    for (index, column) in profile.columns.iter().enumerate() {
        let id_cell = if column.is_candidate_id(profile.rows) {
            Cell::new("yes").fg(Color::Green)
        } else {
            dim_cell("-")
        };
        table.add_row(vec![
            dim_cell(index + 1),
            Cell::new(&column.name),
            Cell::new(column.present),
            Cell::new(column.distinct),
            id_cell,
        ]);
    }
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
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

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
