use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::feed::FeedItem;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn create_cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

/// Label changes in cyan, other system notes grey, comments uncolored.
pub fn activity_cell(item: &FeedItem) -> Cell {
    let cell = Cell::new(&item.body);
    if item.kind == "label" {
        cell.fg(TableColor::Cyan)
    } else if item.system {
        cell.fg(TableColor::DarkGrey)
    } else {
        cell
    }
}

pub fn deployment_status_color(status: &str) -> TableColor {
    match status {
        "success" => TableColor::Green,
        "running" | "created" => TableColor::Yellow,
        "failed" => TableColor::Red,
        _ => TableColor::DarkGrey,
    }
}
