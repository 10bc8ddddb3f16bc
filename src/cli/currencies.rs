use super::ui;
use crate::core::currency::Catalog;
use comfy_table::{Cell, Table};

pub fn run(catalog: &Catalog) {
    if catalog.is_empty() {
        println!("No currencies configured.");
        return;
    }
    println!("{}", ui::style_text("Currencies", ui::StyleType::Title));
    println!("{}", build_table(catalog));
}

fn build_table(catalog: &Catalog) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(""),
        ui::header_cell("Code"),
        ui::header_cell("Name"),
    ]);
    for currency in catalog.iter() {
        table.add_row(vec![
            Cell::new(&currency.flag),
            Cell::new(&currency.code),
            Cell::new(&currency.name),
        ]);
    }
    table
}
