use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, info, trace};

use crate::column::Column;
use crate::domain::{CMDMode, Message, TQConfig};
use crate::inputter::{InputResult, Inputter};
use crate::loader::Dataset;
use crate::pagination::Pagination;
use crate::query::{MenuKind, QueryConfig, SortDirection, TableQueryEngine};
use crate::value::Row;

pub const COLUMN_WIDTH_MARGIN: usize = 1;
pub const COLUMN_SPACING: usize = 1;

#[derive(Debug, PartialEq)]
pub enum Status {
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    Table,
    Prompt,
    Menu(MenuKind),
    Help,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub data: Vec<String>,
    pub sort: Option<SortDirection>,
    pub filtered: bool,
}

/// A popup hanging off the header cell at `anchor` (position in `UIData::table`).
#[derive(Debug, Clone)]
pub struct MenuView {
    pub title: String,
    pub anchor: usize,
    pub items: Vec<String>,
    pub selected: usize,
}

/// Everything the ui needs to paint one frame.
pub struct UIData {
    pub name: String,
    pub table: Vec<ColumnView>,
    pub nrows: usize,      // rows in the derived view
    pub total_rows: usize, // rows in the source list
    pub selected_row: usize,
    pub selected_column: Option<usize>,
    pub page: usize,
    pub page_count: usize,
    pub rows_per_page: usize,
    pub search_text: String,
    pub menu: Option<MenuView>,
    pub show_help: bool,
    pub cmdinput: InputResult,
    pub cmd_mode: Option<CMDMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            table: Vec::new(),
            nrows: 0,
            total_rows: 0,
            selected_row: 0,
            selected_column: None,
            page: 0,
            page_count: 1,
            rows_per_page: 0,
            search_text: String::new(),
            menu: None,
            show_help: false,
            cmdinput: InputResult::default(),
            cmd_mode: None,
            active_cmdinput: false,
            status_message: String::new(),
        }
    }
}

pub struct Model {
    config: TQConfig,
    pub status: Status,
    modus: Modus,
    name: String,
    rows: Vec<Row>,
    columns: Vec<Column>,
    query: TableQueryEngine,
    view: Vec<usize>, // Positions in `rows` of the derived view
    view_outdated: bool,
    pagination: Pagination,
    curser_row: usize,    // Row within the current page
    curser_column: usize, // Index into the visible columns
    offset_column: usize,
    table_width: usize,
    menu_curser: usize,
    input: Inputter,
    last_input: InputResult,
    cmd_mode: Option<CMDMode>,
    status_message: String,
    uidata: UIData,
}

impl Model {
    pub fn init(
        config: &TQConfig,
        query_config: QueryConfig,
        dataset: Dataset,
        columns: Vec<Column>,
        ui_width: usize,
    ) -> Self {
        let query = TableQueryEngine::new(query_config, &columns);
        let mut model = Self {
            config: config.clone(),
            status: Status::Ready,
            modus: Modus::Table,
            name: dataset.name,
            rows: dataset.rows,
            columns,
            query,
            view: Vec::new(),
            view_outdated: true,
            pagination: Pagination::new(config.rows_per_page),
            curser_row: 0,
            curser_column: 0,
            offset_column: 0,
            table_width: ui_width,
            menu_curser: 0,
            input: Inputter::default(),
            last_input: InputResult::default(),
            cmd_mode: None,
            status_message: String::new(),
            uidata: UIData::empty(),
        };
        let message = format!("Loaded {} rows, press ? for help", model.rows.len());
        model.set_status_message(message);
        model.refresh();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    /// Prompts receive raw key events instead of mapped messages.
    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::Prompt
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    pub fn update(&mut self, msg: Message) {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
        match self.modus {
            Modus::Table => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_up(),
                Message::MoveDown => self.move_down(),
                Message::MoveLeft => self.curser_column = self.curser_column.saturating_sub(1),
                Message::MoveRight => self.curser_column += 1,
                Message::NextPage => {
                    self.pagination.next_page(self.view.len());
                    self.curser_row = 0;
                }
                Message::PreviousPage => {
                    self.pagination.previous_page();
                    self.curser_row = 0;
                }
                Message::MoreRowsPerPage => self.pagination.cycle_rows_per_page(1),
                Message::FewerRowsPerPage => self.pagination.cycle_rows_per_page(-1),
                Message::Search => self.enter_prompt(CMDMode::Search),
                Message::Filter => self.enter_prompt(CMDMode::Filter),
                Message::ClearFilters => {
                    self.query.state.clear_filters();
                    self.view_outdated = true;
                    self.set_status_message("Cleared all filters");
                }
                Message::ClearSort => {
                    self.query.state.clear_sort();
                    self.view_outdated = true;
                    self.set_status_message("Cleared sort");
                }
                Message::Sort => self.sort_current_column(),
                Message::SortMenu => self.open_menu(MenuKind::Sort),
                Message::ColumnMenu => self.open_menu(MenuKind::Columns),
                Message::Help => self.modus = Modus::Help,
                Message::Resize(width, _) => self.table_width = width,
                _ => (),
            },
            Modus::Menu(kind) => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.menu_curser = self.menu_curser.saturating_sub(1),
                Message::MoveDown => self.menu_curser += 1,
                Message::Enter | Message::Toggle => self.select_menu_entry(kind),
                Message::Exit => self.close_menu(kind),
                Message::Resize(width, _) => self.table_width = width,
                _ => (),
            },
            Modus::Help => match msg {
                Message::Quit => self.quit(),
                Message::Exit | Message::Enter | Message::Help => self.modus = Modus::Table,
                Message::Resize(width, _) => self.table_width = width,
                _ => (),
            },
            Modus::Prompt => match msg {
                Message::RawKey(key) => self.raw_input(key),
                Message::Resize(width, _) => self.table_width = width,
                _ => (),
            },
        }
        self.refresh();
    }

    // ---------------------------- Derived view ---------------------------- //

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    fn visible_columns(&self) -> Vec<&Column> {
        self.query.state.visible_columns(&self.columns)
    }

    fn current_column(&self) -> Option<&Column> {
        self.visible_columns().get(self.curser_column).copied()
    }

    /// Recomputes the derived view if the query changed, then rebuilds the ui data.
    fn refresh(&mut self) {
        if self.view_outdated {
            self.view = self.query.derive_indices(&self.rows);
            self.pagination.clamp(self.view.len());
            self.view_outdated = false;
            debug!("View holds {} of {} rows", self.view.len(), self.rows.len());
        }

        let page_len = self.pagination.range(self.view.len()).len();
        self.curser_row = std::cmp::min(self.curser_row, page_len.saturating_sub(1));
        let ncolumns = self.visible_columns().len();
        self.curser_column = std::cmp::min(self.curser_column, ncolumns.saturating_sub(1));
        self.offset_column = std::cmp::min(self.offset_column, self.curser_column);

        self.build_uidata();
    }

    fn calculate_column_width(&self, column: &Column, data: &[String]) -> usize {
        let content = data.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        let width = std::cmp::max(column.label.chars().count() + 2, content) + COLUMN_WIDTH_MARGIN;
        std::cmp::min(width, self.config.max_column_width)
    }

    fn build_column_views(&self) -> Vec<ColumnView> {
        let page = &self.view[self.pagination.range(self.view.len())];
        let sort = self.query.state.sort();
        let filters = self.query.state.filter_values();
        self.visible_columns()
            .into_iter()
            .map(|column| {
                let data: Vec<String> = page
                    .iter()
                    .map(|&ridx| column.cell(&self.rows[ridx]).replace('\n', " ↵ "))
                    .collect();
                ColumnView {
                    name: column.label.clone(),
                    width: self.calculate_column_width(column, &data),
                    data,
                    sort: sort.filter(|s| s.key == column.id).map(|s| s.direction),
                    filtered: filters.contains_key(&column.id),
                }
            })
            .collect()
    }

    /// First visible column and how many columns fit into the table width from there.
    fn column_window(&mut self, views: &[ColumnView]) -> (usize, usize) {
        let fits = |offset: usize| {
            let mut used = 0;
            let mut count = 0;
            for view in &views[offset..] {
                if count > 0 && used + view.width + COLUMN_SPACING > self.table_width {
                    break;
                }
                used += view.width + COLUMN_SPACING;
                count += 1;
            }
            count
        };
        let mut count = fits(self.offset_column);
        while count > 0 && self.curser_column >= self.offset_column + count {
            self.offset_column += 1;
            count = fits(self.offset_column);
        }
        (self.offset_column, count)
    }

    fn build_uidata(&mut self) {
        let views = self.build_column_views();
        let (offset, count) = self.column_window(&views);
        let table: Vec<ColumnView> = views.into_iter().skip(offset).take(count).collect();
        let selected_column = (!table.is_empty()).then(|| self.curser_column - offset);
        let menu = match self.modus {
            Modus::Menu(kind) => self.build_menu_view(kind, offset),
            _ => None,
        };

        self.uidata = UIData {
            name: self.name.clone(),
            table,
            nrows: self.view.len(),
            total_rows: self.rows.len(),
            selected_row: self.curser_row,
            selected_column,
            page: self.pagination.page(),
            page_count: self.pagination.page_count(self.view.len()),
            rows_per_page: self.pagination.rows_per_page(),
            search_text: self.query.state.search_text().to_string(),
            menu,
            show_help: self.modus == Modus::Help,
            cmdinput: self.last_input.clone(),
            cmd_mode: self.cmd_mode,
            active_cmdinput: self.modus == Modus::Prompt,
            status_message: self.status_message.clone(),
        };
    }

    // ------------------------------ Navigation ----------------------------- //

    fn move_up(&mut self) {
        if self.curser_row > 0 {
            self.curser_row -= 1;
        } else if self.pagination.page() > 0 {
            self.pagination.previous_page();
            self.curser_row = self.pagination.rows_per_page() - 1;
        }
    }

    fn move_down(&mut self) {
        let page_len = self.pagination.range(self.view.len()).len();
        if self.curser_row + 1 < page_len {
            self.curser_row += 1;
        } else if self.pagination.page() + 1 < self.pagination.page_count(self.view.len()) {
            self.pagination.next_page(self.view.len());
            self.curser_row = 0;
        }
    }

    // -------------------------------- Query -------------------------------- //

    fn sort_current_column(&mut self) {
        let Some(column) = self.current_column() else {
            return;
        };
        if !column.sortable {
            let message = format!("{} can not be sorted", column.label);
            self.set_status_message(message);
            return;
        }
        let (id, label) = (column.id.clone(), column.label.clone());
        self.query.state.set_sort(&id);
        self.view_outdated = true;
        if let Some(sort) = self.query.state.sort() {
            let message = format!("Sorted by {} {}", label, sort.direction.as_str());
            self.set_status_message(message);
        }
    }

    fn enter_prompt(&mut self, mode: CMDMode) {
        let prefill = match mode {
            CMDMode::Search => self.query.state.search_text().to_string(),
            CMDMode::Filter => {
                let Some(column) = self.current_column() else {
                    return;
                };
                if !column.filterable {
                    let message = format!("{} can not be filtered", column.label);
                    self.set_status_message(message);
                    return;
                }
                let prefill = self
                    .query
                    .state
                    .filter_values()
                    .get(&column.id)
                    .cloned()
                    .unwrap_or_default();
                self.query.state.open_menu(MenuKind::Filter, self.curser_column);
                prefill
            }
        };
        trace!("Entering prompt {mode:?} ...");
        self.modus = Modus::Prompt;
        self.cmd_mode = Some(mode);
        self.input.clear();
        self.input.set(&prefill);
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.handle_cmd_input();
        }
    }

    fn handle_cmd_input(&mut self) {
        let input = self.last_input.clone();
        trace!("Handle cmd input {:?}", input);
        self.modus = Modus::Table;

        match self.cmd_mode.take() {
            Some(CMDMode::Search) if !input.canceled => {
                self.query.state.set_search_text(input.input.as_str());
                self.view_outdated = true;
                self.pagination.set_page(0);
                self.curser_row = 0;
                self.set_status_message(format!("Search \"{}\"", input.input));
            }
            Some(CMDMode::Filter) => {
                let column_id = self
                    .query
                    .state
                    .menu_anchor(MenuKind::Filter)
                    .and_then(|anchor| self.visible_columns().get(anchor).map(|c| c.id.clone()));
                if !input.canceled
                    && let Some(id) = column_id
                {
                    self.query.state.set_filter_value(id, input.input.as_str());
                    self.view_outdated = true;
                    self.pagination.set_page(0);
                    self.curser_row = 0;
                }
                self.query.state.close_menu(MenuKind::Filter);
            }
            _ => (),
        }
        info!(
            "Query: search {:?}, filters {:?}, sort {:?}",
            self.query.state.search_text(),
            self.query.state.filter_values(),
            self.query.state.sort()
        );
    }

    // -------------------------------- Menus -------------------------------- //

    /// Column ids and labels a menu offers.
    fn menu_entries(&self, kind: MenuKind) -> Vec<(String, String)> {
        let state = &self.query.state;
        match kind {
            MenuKind::Sort => self
                .visible_columns()
                .into_iter()
                .filter(|c| c.sortable)
                .map(|c| {
                    let marker = match state.sort() {
                        Some(s) if s.key == c.id => format!(" ({})", s.direction.as_str()),
                        _ => String::new(),
                    };
                    (c.id.clone(), format!("{}{}", c.label, marker))
                })
                .collect(),
            MenuKind::Columns => self
                .columns
                .iter()
                .map(|c| {
                    let mark = if state.is_selected(&c.id) { "[x]" } else { "[ ]" };
                    (c.id.clone(), format!("{mark} {}", c.label))
                })
                .collect(),
            MenuKind::Filter => Vec::new(),
        }
    }

    fn open_menu(&mut self, kind: MenuKind) {
        self.query.state.open_menu(kind, self.curser_column);
        self.menu_curser = 0;
        self.modus = Modus::Menu(kind);
    }

    fn close_menu(&mut self, kind: MenuKind) {
        self.query.state.close_menu(kind);
        self.modus = Modus::Table;
    }

    fn select_menu_entry(&mut self, kind: MenuKind) {
        let entries = self.menu_entries(kind);
        let Some((id, _)) = entries.get(self.menu_curser) else {
            return;
        };
        match kind {
            MenuKind::Sort => {
                self.query.state.set_sort(id);
                self.view_outdated = true;
                self.close_menu(kind);
            }
            MenuKind::Columns => {
                self.query.state.toggle_column(id);
            }
            MenuKind::Filter => (),
        }
    }

    fn build_menu_view(&mut self, kind: MenuKind, offset: usize) -> Option<MenuView> {
        let items: Vec<String> = self
            .menu_entries(kind)
            .into_iter()
            .map(|(_, label)| label)
            .collect();
        self.menu_curser = std::cmp::min(self.menu_curser, items.len().saturating_sub(1));
        let anchor = self.query.state.menu_anchor(kind)?;
        let title = match kind {
            MenuKind::Sort => "Sort by",
            MenuKind::Columns => "Columns",
            MenuKind::Filter => "Filter",
        };
        Some(MenuView {
            title: title.to_string(),
            anchor: anchor.saturating_sub(offset),
            items,
            selected: self.menu_curser,
        })
    }
}
