use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Cell, Clear, List, ListState, Paragraph, Row, Table, TableState},
};

use crate::domain::{CMDMode, HELP_TEXT};
use crate::model::{COLUMN_SPACING, ColumnView, MenuView, Model, UIData};
use crate::query::SortDirection;

pub const TITLE_HEIGHT: u16 = 1;
pub const CMDLINE_HEIGHT: u16 = 1;
pub const TABLE_HEADER_HEIGHT: u16 = 1;

#[derive(Default)]
pub struct TableUI {
    table_state: TableState,
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [title_area, table_area, cmdline_area] = Layout::vertical([
            Constraint::Length(TITLE_HEIGHT),
            Constraint::Min(TABLE_HEADER_HEIGHT + 1),
            Constraint::Length(CMDLINE_HEIGHT),
        ])
        .areas(frame.area());

        frame.render_widget(Self::title(uidata), title_area);
        self.draw_table(uidata, frame, table_area);
        Self::draw_cmdline(uidata, frame, cmdline_area);

        if let Some(menu) = &uidata.menu {
            Self::draw_menu(menu, &uidata.table, frame, table_area);
        }
        if uidata.show_help {
            Self::draw_help(frame, table_area);
        }
    }

    fn title(uidata: &UIData) -> Line<'_> {
        let mut spans = vec![
            Span::from(format!(" {} ", uidata.name)).bold(),
            Span::from(format!("│ {} of {} rows ", uidata.nrows, uidata.total_rows)),
            Span::from(format!(
                "│ page {}/{} ({} per page) ",
                uidata.page + 1,
                uidata.page_count,
                uidata.rows_per_page
            )),
        ];
        if !uidata.search_text.is_empty() {
            spans.push(Span::from(format!("│ search \"{}\"", uidata.search_text)).yellow());
        }
        Line::from(spans)
    }

    fn header_cell(column: &ColumnView) -> Cell<'_> {
        let mut spans = vec![Span::from(column.name.as_str()).bold()];
        match column.sort {
            Some(SortDirection::Ascending) => spans.push(Span::from(" ▲").blue()),
            Some(SortDirection::Descending) => spans.push(Span::from(" ▼").blue()),
            None => {}
        }
        if column.filtered {
            spans.push(Span::from(" *").yellow());
        }
        Cell::from(Line::from(spans))
    }

    fn draw_table(&mut self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.table.is_empty() {
            let text = Paragraph::new("No columns selected, press c to pick some.").italic();
            frame.render_widget(text, area);
            return;
        }

        let header = Row::new(uidata.table.iter().map(Self::header_cell))
            .style(Style::new().underlined());
        let nrows = uidata.table[0].data.len();
        let rows = (0..nrows).map(|ridx| {
            Row::new(
                uidata
                    .table
                    .iter()
                    .map(|column| Cell::from(column.data[ridx].as_str())),
            )
        });
        let widths = uidata
            .table
            .iter()
            .map(|column| Constraint::Length(column.width as u16));

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(COLUMN_SPACING as u16)
            .row_highlight_style(Style::new().on_dark_gray())
            .cell_highlight_style(Style::new().reversed());

        self.table_state.select((nrows > 0).then_some(uidata.selected_row));
        self.table_state.select_column(uidata.selected_column);
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_cmdline(uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_cmdinput {
            let prompt = match uidata.cmd_mode {
                Some(CMDMode::Search) => "search: ",
                Some(CMDMode::Filter) => "filter: ",
                None => "",
            };
            let line = Line::from(vec![
                Span::from(prompt).bold(),
                Span::from(uidata.cmdinput.input.as_str()),
            ]);
            frame.render_widget(line, area);
            let x = area.x + (prompt.len() + uidata.cmdinput.curser_pos) as u16;
            frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y));
        } else {
            frame.render_widget(Line::from(uidata.status_message.as_str()).dim(), area);
        }
    }

    /// Popup below the header cell the menu was opened from.
    fn draw_menu(menu: &MenuView, table: &[ColumnView], frame: &mut Frame, area: Rect) {
        let x_offset: usize = table
            .iter()
            .take(menu.anchor)
            .map(|c| c.width + COLUMN_SPACING)
            .sum();
        let width = menu
            .items
            .iter()
            .map(|item| item.chars().count())
            .max()
            .unwrap_or(0)
            .max(menu.title.len())
            + 4;
        let popup = Rect::new(
            area.x + x_offset as u16,
            area.y + TABLE_HEADER_HEIGHT,
            width as u16,
            menu.items.len() as u16 + 2,
        )
        .intersection(area);

        let list = List::new(menu.items.iter().map(String::as_str))
            .block(Block::bordered().title(format!(" {} ", menu.title)))
            .highlight_style(Style::new().reversed());
        let mut state = ListState::default().with_selected(Some(menu.selected));
        frame.render_widget(Clear, popup);
        frame.render_stateful_widget(list, popup, &mut state);
    }

    fn draw_help(frame: &mut Frame, area: Rect) {
        let height = HELP_TEXT.lines().count() as u16 + 2;
        let width = HELP_TEXT.lines().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 4;
        let popup = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        )
        .intersection(area);
        let help = Paragraph::new(HELP_TEXT).block(Block::bordered().title(" Help "));
        frame.render_widget(Clear, popup);
        frame.render_widget(help, popup);
    }
}
