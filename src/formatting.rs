//! formatting renders query output as a text table.

use crate::row::Row;

/// Renders rows the way the CLI prints them: a header line from the first
/// row's column names, then one line per row.
pub fn render_table(rows: &[Row]) -> String {
    let mut out = String::new();
    if rows.is_empty() {
        return out;
    }
    out.push_str(&format!(
        "   | {} |\n",
        rows[0]
            .columns
            .iter()
            .map(|(n, _)| format!("{:15}", n))
            .collect::<Vec<String>>()
            .join(" | ")
    ));
    for row in rows {
        out.push_str(&format!(
            "   | {} |\n",
            row.columns
                .iter()
                .map(|(_, v)| format!("{:15}", v))
                .collect::<Vec<String>>()
                .join(" | ")
        ));
    }
    out
}

#[test]
fn test_render_table() {
    let rows = vec![Row::new(
        "1",
        vec![
            (String::from("Name"), String::from("Movie 1")),
            (String::from("Id"), String::from("1")),
        ],
    )];
    let table = render_table(&rows);
    assert!(table.contains("Name"));
    assert!(table.contains("Movie 1"));
    assert_eq!(table.lines().count(), 2);
}

#[test]
fn test_render_table_empty() {
    assert_eq!(render_table(&[]), "");
}
