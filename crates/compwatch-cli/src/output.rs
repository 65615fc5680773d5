use compwatch_core::competition::Competition;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    // Width in chars: city and competition names are frequently non-ASCII.
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| pad(h, widths[i]))
        .collect();
    println!("{}", header_row.join("  ").trim_end());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| pad(cell, widths.get(i).copied().unwrap_or(0)))
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    format!("{s}{}", " ".repeat(width.saturating_sub(len)))
}

/// Print competitions as an `ID / NAME / CITY / DATES` table.
pub fn print_competitions(comps: &[Competition]) {
    let rows = comps
        .iter()
        .map(|c| {
            vec![
                c.id.clone(),
                c.name.clone(),
                c.city.clone(),
                c.date_range(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "CITY", "DATES"], rows);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_counts_chars_not_bytes() {
        assert_eq!(pad("Concepción", 12), "Concepción  ");
        assert_eq!(pad("toolong", 3), "toolong");
    }
}
