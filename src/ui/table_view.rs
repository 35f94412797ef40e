use ratatui::layout::Constraint;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};

use crate::data::browser::PageView;
use crate::data::columns::Tone;

/// Map a fragment tone to a terminal style. This is the only place tones
/// become colors; the data layer stays presentation-free.
pub fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Neutral => Style::default(),
        Tone::Muted => Style::default().fg(Color::DarkGray),
        Tone::Success => Style::default().fg(Color::Green),
        Tone::Warning => Style::default().fg(Color::Yellow),
        Tone::Danger => Style::default().fg(Color::Red),
        Tone::Info => Style::default().fg(Color::Cyan),
    }
}

/// Column widths sized to the widest cell on the page, header included.
pub fn column_widths(view: &PageView) -> Vec<Constraint> {
    let mut widths: Vec<usize> = view.headers.iter().map(|h| h.len()).collect();
    let has_actions = view.rows.iter().any(|row| !row.actions.is_empty());
    if has_actions {
        widths.push("Actions".len());
    }

    for row in &view.rows {
        for (idx, cell) in row.cells.iter().enumerate() {
            if idx < widths.len() {
                widths[idx] = widths[idx].max(cell.text.len());
            }
        }
        if has_actions {
            let last = widths.len() - 1;
            widths[last] = widths[last].max(actions_text(&row.actions).len());
        }
    }

    widths
        .into_iter()
        .map(|w| Constraint::Length(w as u16 + 2))
        .collect()
}

fn actions_text(labels: &[String]) -> String {
    labels
        .iter()
        .enumerate()
        .map(|(idx, label)| format!("{}:{}", idx + 1, label))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the widget for the current page. Pass the result to a stateful
/// render with the dashboard's row selection.
pub fn table_for(view: &PageView, title: &str) -> Table<'static> {
    let has_actions = view.rows.iter().any(|row| !row.actions.is_empty());

    let mut header_cells: Vec<Cell> = view
        .headers
        .iter()
        .map(|h| Cell::from(h.clone()).style(Style::default().add_modifier(Modifier::BOLD)))
        .collect();
    if has_actions {
        header_cells
            .push(Cell::from("Actions").style(Style::default().add_modifier(Modifier::BOLD)));
    }

    let rows: Vec<Row> = view
        .rows
        .iter()
        .map(|row| {
            let mut cells: Vec<Cell> = row
                .cells
                .iter()
                .map(|fragment| {
                    Cell::from(fragment.text.clone()).style(tone_style(fragment.tone))
                })
                .collect();
            if has_actions {
                cells.push(
                    Cell::from(actions_text(&row.actions)).style(tone_style(Tone::Muted)),
                );
            }
            Row::new(cells)
        })
        .collect();

    Table::new(rows, column_widths(view))
        .header(Row::new(header_cells))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
}

/// Footer text under the table. Pager controls only appear when there is
/// more than one page to move between.
pub fn footer_line(view: &PageView, show_totals: bool) -> String {
    let mut parts = Vec::new();
    if show_totals {
        parts.push(format!("Total: {}", view.filtered_count));
    }
    if view.show_pager {
        parts.push(format!(
            "[ Prev | Page {} of {} | Next ]",
            view.page_index, view.total_pages
        ));
    }
    parts.join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::browser::RowView;
    use crate::data::columns::Fragment;

    fn view(rows: usize, total_pages: usize) -> PageView {
        PageView {
            headers: vec!["ID".to_string(), "Name".to_string()],
            rows: (0..rows)
                .map(|i| RowView {
                    cells: vec![
                        Fragment::plain(format!("S_{:03}", i + 1)),
                        Fragment::plain("A Student Name"),
                    ],
                    actions: Vec::new(),
                })
                .collect(),
            placeholder: None,
            page_index: 1,
            total_pages,
            filtered_count: rows,
            show_pager: total_pages > 1,
        }
    }

    #[test]
    fn test_footer_hides_pager_on_single_page() {
        let line = footer_line(&view(3, 1), true);
        assert!(line.contains("Total: 3"));
        assert!(!line.contains("Prev"));

        let line = footer_line(&view(3, 2), true);
        assert!(line.contains("Page 1 of 2"));
    }

    #[test]
    fn test_widths_cover_widest_cell() {
        let widths = column_widths(&view(2, 1));
        // "A Student Name" (14) beats the header "Name" (4)
        assert_eq!(widths[1], Constraint::Length(16));
    }
}
