use anyhow::Result;
use carbon_calc::{format_kg, Bucket, CalcError, Calculator, Dimensions, LineItem};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;

const DIMENSION_LABELS: [&str; 5] = ["Nr", "Length", "Width", "Depth", "Factor"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Material,
    SubMaterial,
    Reference,
    Quantity,
    Dimensions,
    Adds,
    Omits,
    Name,
    Description,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Focus::Material => Focus::SubMaterial,
            Focus::SubMaterial => Focus::Reference,
            Focus::Reference => Focus::Quantity,
            Focus::Quantity => Focus::Dimensions,
            Focus::Dimensions => Focus::Adds,
            Focus::Adds => Focus::Omits,
            Focus::Omits => Focus::Name,
            Focus::Name => Focus::Description,
            Focus::Description => Focus::Material,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Focus::Material => Focus::Description,
            Focus::SubMaterial => Focus::Material,
            Focus::Reference => Focus::SubMaterial,
            Focus::Quantity => Focus::Reference,
            Focus::Dimensions => Focus::Quantity,
            Focus::Adds => Focus::Dimensions,
            Focus::Omits => Focus::Adds,
            Focus::Name => Focus::Omits,
            Focus::Description => Focus::Name,
        }
    }

    fn is_text(&self) -> bool {
        matches!(
            self,
            Focus::Quantity | Focus::Dimensions | Focus::Name | Focus::Description
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

/// Single-line text field. Numeric fields only accept digits, '.' and '-'.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    pub value: String,
    numeric: bool,
}

impl TextInput {
    fn text(value: &str) -> Self {
        TextInput {
            value: value.to_string(),
            numeric: false,
        }
    }

    fn number(value: &str) -> Self {
        TextInput {
            value: value.to_string(),
            numeric: true,
        }
    }

    fn push(&mut self, c: char) {
        if !self.numeric || c.is_ascii_digit() || c == '.' || c == '-' {
            self.value.push(c);
        }
    }

    fn backspace(&mut self) {
        self.value.pop();
    }

    fn as_f64(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }
}

/// Saved calculation picker shown over the main screen.
pub struct LoadPopup {
    pub names: Vec<String>,
    pub state: ListState,
}

pub struct App {
    pub calc: Calculator,
    pub focus: Focus,
    pub materials: Vec<String>,
    pub material_state: ListState,
    pub sub_materials: Vec<String>,
    pub sub_material_state: ListState,
    pub reference_names: Vec<String>,
    pub reference_state: ListState,
    pub quantity: TextInput,
    pub dimensions: [TextInput; 5],
    pub dimension_index: usize,
    pub name: TextInput,
    pub description: TextInput,
    pub adds_state: ListState,
    pub omits_state: ListState,
    pub load_popup: Option<LoadPopup>,
    pub status: Status,
    pub should_quit: bool,
}

impl App {
    pub fn new(calc: Calculator) -> Self {
        let materials = calc.db().materials();

        let mut app = Self {
            calc,
            focus: Focus::Material,
            materials,
            material_state: ListState::default(),
            sub_materials: Vec::new(),
            sub_material_state: ListState::default(),
            reference_names: Vec::new(),
            reference_state: ListState::default(),
            quantity: TextInput::number("0"),
            dimensions: [
                TextInput::number("1"),
                TextInput::number("1"),
                TextInput::number("1"),
                TextInput::number("1"),
                TextInput::number("1"),
            ],
            dimension_index: 0,
            name: TextInput::text(""),
            description: TextInput::text(""),
            adds_state: ListState::default(),
            omits_state: ListState::default(),
            load_popup: None,
            status: Status {
                kind: StatusKind::Info,
                text: "Select a material to start".to_string(),
            },
            should_quit: false,
        };

        app.select_material(if app.materials.is_empty() { None } else { Some(0) });
        app
    }

    // ========================================================================
    // SELECTION CASCADE
    // ========================================================================

    pub fn selected_material(&self) -> Option<&str> {
        selected(&self.materials, &self.material_state)
    }

    pub fn selected_sub_material(&self) -> Option<&str> {
        selected(&self.sub_materials, &self.sub_material_state)
    }

    pub fn selected_reference(&self) -> Option<&str> {
        selected(&self.reference_names, &self.reference_state)
    }

    fn select_material(&mut self, index: Option<usize>) {
        self.material_state.select(index);
        self.sub_materials = match self.selected_material() {
            Some(material) => self.calc.db().sub_materials(material),
            None => Vec::new(),
        };
        let first = if self.sub_materials.is_empty() { None } else { Some(0) };
        self.select_sub_material(first);
    }

    fn select_sub_material(&mut self, index: Option<usize>) {
        self.sub_material_state.select(index);
        self.reference_names = match (self.selected_material(), self.selected_sub_material()) {
            (Some(material), Some(sub)) => self.calc.db().reference_names(material, sub),
            _ => Vec::new(),
        };
        let first = if self.reference_names.is_empty() { None } else { Some(0) };
        self.reference_state.select(first);
    }

    /// Declared unit of the selected record, for display.
    pub fn selected_unit(&self) -> Option<&str> {
        self.selected_reference()
            .and_then(|name| self.calc.db().unit_of(name).ok())
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    pub fn calculated_quantity(&self) -> Option<f64> {
        let mut values = [0.0; 5];
        for (value, input) in values.iter_mut().zip(self.dimensions.iter()) {
            *value = input.as_f64()?;
        }
        let dims = Dimensions {
            count: values[0],
            length: values[1],
            width: values[2],
            depth: values[3],
            factor: values[4],
        };
        Some(dims.quantity())
    }

    pub fn use_calculated_quantity(&mut self) {
        match self.calculated_quantity() {
            Some(qty) => {
                self.quantity.value = format!("{:.4}", qty);
                self.info(format!("Quantity set to {:.4}", qty));
            }
            None => self.warn("Dimensions must all be numbers"),
        }
    }

    /// Add the selected record to a list. Requires a finite quantity > 0 and a selection.
    pub fn accrue(&mut self, bucket: Bucket) {
        let qty = self.quantity.as_f64().unwrap_or(0.0);
        let reference = match self.selected_reference().map(str::to_string) {
            Some(name) if qty.is_finite() && qty > 0.0 => name,
            _ => {
                self.warn("Select an ICE DB Name and enter a quantity above zero");
                return;
            }
        };

        let result = self
            .calc
            .add_item(bucket, &reference, qty)
            .map(|item| item.total_carbon);

        match result {
            Ok(total) => {
                self.sync_list_states();
                self.success(format!("{} {} ({} kgCO₂e)", bucket, reference, format_kg(total)));
            }
            Err(e) => self.report(e),
        }
    }

    pub fn delete_selected(&mut self, bucket: Bucket) {
        let index = match bucket {
            Bucket::Add => self.adds_state.selected(),
            Bucket::Omit => self.omits_state.selected(),
        };
        let Some(index) = index else {
            self.warn("Nothing selected");
            return;
        };

        match self.calc.delete_item(bucket, index) {
            Ok(item) => {
                self.sync_list_states();
                self.info(format!("Deleted {} {}", bucket, item.reference_name));
            }
            Err(e) => self.report(e),
        }
    }

    pub fn save(&mut self) {
        let name = self.name.value.clone();
        if name.trim().is_empty() {
            self.report(CalcError::EmptyName);
            return;
        }

        match self.calc.save_calculation(&name, &self.description.value) {
            Ok(path) => self.success(format!("Saved to {}", path.display())),
            Err(e) => self.report(e),
        }
    }

    pub fn open_load_popup(&mut self) {
        match self.calc.saved_calculations() {
            Ok(names) if names.is_empty() => self.info("No saved calculations found."),
            Ok(names) => {
                let mut state = ListState::default();
                state.select(Some(0));
                self.load_popup = Some(LoadPopup { names, state });
            }
            Err(e) => self.report(e),
        }
    }

    fn load_selected(&mut self) {
        let Some(popup) = self.load_popup.take() else {
            return;
        };
        let Some(key) = selected(&popup.names, &popup.state).map(str::to_string) else {
            return;
        };

        let result = self
            .calc
            .load_calculation(&key)
            .map(|s| (s.name.clone(), s.description.clone()));

        match result {
            Ok((name, description)) => {
                self.name.value = name;
                self.description.value = description;
                self.sync_list_states();
                self.success(format!("Loaded {}", key));
            }
            Err(e) => self.report(e),
        }
    }

    /// Keep list selections inside the current list bounds.
    fn sync_list_states(&mut self) {
        let adds = self.calc.session().adds.len();
        let omits = self.calc.session().omits.len();
        clamp(&mut self.adds_state, adds);
        clamp(&mut self.omits_state, omits);
    }

    // ========================================================================
    // STATUS
    // ========================================================================

    fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Status {
            kind,
            text: text.into(),
        };
    }

    fn info(&mut self, text: impl Into<String>) {
        self.set_status(StatusKind::Info, text);
    }

    fn success(&mut self, text: impl Into<String>) {
        self.set_status(StatusKind::Success, text);
    }

    fn warn(&mut self, text: impl Into<String>) {
        self.set_status(StatusKind::Warning, text);
    }

    fn report(&mut self, err: CalcError) {
        if err.is_user_error() {
            tracing::warn!(error = %err, "operation rejected");
            self.warn(err.to_string());
        } else {
            tracing::error!(error = %err, "operation failed");
            self.set_status(StatusKind::Error, err.to_string());
        }
    }

    // ========================================================================
    // KEYS
    // ========================================================================

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.load_popup.is_some() {
            self.handle_popup_key(key);
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::F(2) => self.save(),
            KeyCode::F(3) => self.open_load_popup(),
            KeyCode::F(5) => self.accrue(Bucket::Add),
            KeyCode::F(6) => self.accrue(Bucket::Omit),
            KeyCode::F(7) => self.use_calculated_quantity(),
            KeyCode::Char('q') if !self.focus.is_text() => self.should_quit = true,
            _ => self.handle_focus_key(key.code),
        }
    }

    fn handle_focus_key(&mut self, code: KeyCode) {
        match self.focus {
            Focus::Material => {
                if let Some(i) = step(&self.material_state, self.materials.len(), code) {
                    self.select_material(Some(i));
                }
            }
            Focus::SubMaterial => {
                if let Some(i) = step(&self.sub_material_state, self.sub_materials.len(), code) {
                    self.select_sub_material(Some(i));
                }
            }
            Focus::Reference => {
                if let Some(i) = step(&self.reference_state, self.reference_names.len(), code) {
                    self.reference_state.select(Some(i));
                }
            }
            Focus::Adds | Focus::Omits => {
                let bucket = if self.focus == Focus::Adds { Bucket::Add } else { Bucket::Omit };
                match code {
                    KeyCode::Delete | KeyCode::Char('d') => self.delete_selected(bucket),
                    _ => {
                        let len = self.calc.session().items(bucket).len();
                        let state = match bucket {
                            Bucket::Add => &mut self.adds_state,
                            Bucket::Omit => &mut self.omits_state,
                        };
                        if let Some(i) = step(state, len, code) {
                            state.select(Some(i));
                        }
                    }
                }
            }
            Focus::Dimensions => match code {
                KeyCode::Up => self.dimension_index = self.dimension_index.saturating_sub(1),
                KeyCode::Down => {
                    self.dimension_index = (self.dimension_index + 1).min(DIMENSION_LABELS.len() - 1)
                }
                KeyCode::Char(c) => self.dimensions[self.dimension_index].push(c),
                KeyCode::Backspace => self.dimensions[self.dimension_index].backspace(),
                _ => {}
            },
            Focus::Quantity | Focus::Name | Focus::Description => {
                let input = match self.focus {
                    Focus::Quantity => &mut self.quantity,
                    Focus::Name => &mut self.name,
                    _ => &mut self.description,
                };
                match code {
                    KeyCode::Char(c) => input.push(c),
                    KeyCode::Backspace => input.backspace(),
                    _ => {}
                }
            }
        }
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        let Some(popup) = self.load_popup.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Esc => self.load_popup = None,
            KeyCode::Enter => self.load_selected(),
            code => {
                if let Some(i) = step(&popup.state, popup.names.len(), code) {
                    popup.state.select(Some(i));
                }
            }
        }
    }
}

fn selected<'a>(items: &'a [String], state: &ListState) -> Option<&'a str> {
    state.selected().and_then(|i| items.get(i)).map(String::as_str)
}

/// New index after an arrow key, wrapping at both ends.
fn step(state: &ListState, len: usize, code: KeyCode) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let current = state.selected().unwrap_or(0);
    match code {
        KeyCode::Down | KeyCode::Char('j') => Some(if current >= len - 1 { 0 } else { current + 1 }),
        KeyCode::Up | KeyCode::Char('k') => Some(if current == 0 { len - 1 } else { current - 1 }),
        KeyCode::Home => Some(0),
        KeyCode::End => Some(len - 1),
        _ => None,
    }
}

fn clamp(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}

// ============================================================================
// TERMINAL LOOP
// ============================================================================

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with name/description
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35), // Material selectors
            Constraint::Percentage(25), // Quantity + calculation fields
            Constraint::Percentage(40), // Lists + totals
        ])
        .split(chunks[1]);

    render_selectors(f, columns[0], app);
    render_inputs(f, columns[1], app);
    render_lists(f, columns[2], app);

    render_status_bar(f, chunks[2], app);

    if app.load_popup.is_some() {
        let area = f.size();
        render_load_popup(f, area, app);
    }
}

fn panel(title: &str, focused: bool) -> Block<'_> {
    let border = if focused { Color::Yellow } else { Color::White };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title)
}

fn highlight() -> Style {
    Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let session = app.calc.session();
    let spans = vec![
        Span::styled(
            "🌍 Embodied Carbon Calculator",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("{} ICE DB records", app.calc.db().len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("+ {}", session.adds.len()),
            Style::default().fg(Color::Red),
        ),
        Span::raw("  "),
        Span::styled(
            format!("- {}", session.omits.len()),
            Style::default().fg(Color::Green),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn selector_list(items: &[String], title: &'static str, focused: bool) -> List<'static> {
    List::new(items.iter().map(|s| ListItem::new(s.clone())).collect::<Vec<_>>())
        .block(panel(title, focused))
        .highlight_style(highlight())
        .highlight_symbol("→ ")
}

fn render_selectors(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area);

    f.render_stateful_widget(
        selector_list(&app.materials, " Material ", app.focus == Focus::Material),
        chunks[0],
        &mut app.material_state,
    );
    f.render_stateful_widget(
        selector_list(&app.sub_materials, " Sub-Material ", app.focus == Focus::SubMaterial),
        chunks[1],
        &mut app.sub_material_state,
    );
    f.render_stateful_widget(
        selector_list(&app.reference_names, " ICE DB Name ", app.focus == Focus::Reference),
        chunks[2],
        &mut app.reference_state,
    );

    let unit = match app.selected_unit() {
        Some(unit) => format!("Unit of measure: {}", unit),
        None => "Unit of measure: -".to_string(),
    };
    let unit = Paragraph::new(unit)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(unit, chunks[3]);
}

fn input_line<'a>(label: &'a str, input: &'a TextInput, active: bool) -> Line<'a> {
    let value_style = if active {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    };
    Line::from(vec![
        Span::styled(
            format!("  {}: ", label),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(input.value.as_str(), value_style),
        Span::raw(if active { "▏" } else { "" }),
    ])
}

fn render_inputs(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(9),
            Constraint::Min(4),
        ])
        .split(area);

    let quantity = Paragraph::new(vec![input_line(
        "Quantity",
        &app.quantity,
        app.focus == Focus::Quantity,
    )])
    .block(panel(" Quantity ", app.focus == Focus::Quantity));
    f.render_widget(quantity, chunks[0]);

    let mut lines: Vec<Line> = DIMENSION_LABELS
        .iter()
        .zip(app.dimensions.iter())
        .enumerate()
        .map(|(i, (label, input))| {
            input_line(
                label,
                input,
                app.focus == Focus::Dimensions && app.dimension_index == i,
            )
        })
        .collect();
    let calculated = match app.calculated_quantity() {
        Some(qty) => format!("{:.4}", qty),
        None => "invalid".to_string(),
    };
    lines.push(Line::from(vec![
        Span::raw("  Calculated Quantity: "),
        Span::styled(calculated, Style::default().add_modifier(Modifier::BOLD)),
    ]));
    let dims = Paragraph::new(lines)
        .block(panel(" 📐 Quantity from Dimensions ", app.focus == Focus::Dimensions));
    f.render_widget(dims, chunks[1]);

    let meta = Paragraph::new(vec![
        input_line("Calculation Name", &app.name, app.focus == Focus::Name),
        Line::from(""),
        input_line("Description", &app.description, app.focus == Focus::Description),
    ])
    .block(panel(
        " Calculation ",
        matches!(app.focus, Focus::Name | Focus::Description),
    ));
    f.render_widget(meta, chunks[2]);
}

fn line_items(items: &[LineItem]) -> Vec<ListItem<'static>> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| ListItem::new(item.summary(i)))
        .collect()
}

fn render_lists(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(40),
            Constraint::Min(5),
        ])
        .split(area);

    let adds = List::new(line_items(&app.calc.session().adds))
        .block(panel(" Adds ", app.focus == Focus::Adds))
        .highlight_style(highlight())
        .highlight_symbol("→ ");
    f.render_stateful_widget(adds, chunks[0], &mut app.adds_state);

    let omits = List::new(line_items(&app.calc.session().omits))
        .block(panel(" Omits ", app.focus == Focus::Omits))
        .highlight_style(highlight())
        .highlight_symbol("→ ");
    f.render_stateful_widget(omits, chunks[1], &mut app.omits_state);

    let totals = app.calc.update_totals();
    let net_color = if totals.net_change > 0.0 {
        Color::Red
    } else {
        Color::Green
    };
    let content = vec![
        Line::from(vec![
            Span::styled("  Total Adds (kgCO₂e): ", Style::default().fg(Color::Cyan)),
            Span::raw(format_kg(totals.total_add)),
        ]),
        Line::from(vec![
            Span::styled("  Total Omits (kgCO₂e): ", Style::default().fg(Color::Cyan)),
            Span::raw(format_kg(totals.total_omit)),
        ]),
        Line::from(vec![
            Span::styled(
                "  Net Change (kgCO₂e): ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format_kg(totals.net_change),
                Style::default().fg(net_color).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    let totals = Paragraph::new(content).block(panel(" Totals ", false));
    f.render_widget(totals, chunks[2]);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let color = match app.status.kind {
        StatusKind::Info => Color::White,
        StatusKind::Success => Color::Green,
        StatusKind::Warning => Color::Yellow,
        StatusKind::Error => Color::Red,
    };

    let mut status_spans = vec![
        Span::styled(format!(" {} ", app.status.text), Style::default().fg(color)),
        Span::raw(" | "),
    ];
    for (key, label) in [
        ("F5", " Add | "),
        ("F6", " Omit | "),
        ("F7", " Use calc qty | "),
        ("F2", " Save | "),
        ("F3", " Load | "),
        ("Tab", " Panel | "),
        ("d", " Delete | "),
    ] {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_load_popup(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(popup) = app.load_popup.as_mut() else {
        return;
    };
    let area = centered_rect(50, 50, area);

    let list = List::new(
        popup
            .names
            .iter()
            .map(|n| ListItem::new(n.clone()))
            .collect::<Vec<_>>(),
    )
    .block(panel(" 📂 Load Calculation (Enter load, Esc cancel) ", true))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_widget(Clear, area);
    f.render_stateful_widget(list, area, &mut popup.state);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use carbon_calc::{IceDb, MaterialRecord, SessionStore};
    use ratatui::backend::TestBackend;
    use tempfile::TempDir;

    fn test_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let db = IceDb::from_records(vec![
            MaterialRecord::new("Concrete", "In-situ", "Concrete C30", "kg", 0.12),
            MaterialRecord::new("Concrete", "In-situ", "Concrete C40", "kg", 0.138),
            MaterialRecord::new("Concrete", "Precast", "Precast slab", "m3", 300.0),
            MaterialRecord::new("Steel", "Rebar", "Rebar UK", "kg", 1.99),
        ]);
        let store = SessionStore::open(dir.path()).unwrap();
        (dir, App::new(Calculator::new(db, store)))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_initial_cascade_selects_first_of_each() {
        let (_dir, app) = test_app();
        assert_eq!(app.selected_material(), Some("Concrete"));
        assert_eq!(app.selected_sub_material(), Some("In-situ"));
        assert_eq!(app.selected_reference(), Some("Concrete C30"));
        assert_eq!(app.selected_unit(), Some("kg"));
    }

    #[test]
    fn test_changing_material_resets_lower_selectors() {
        let (_dir, mut app) = test_app();
        app.focus = Focus::SubMaterial;
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_reference(), Some("Precast slab"));

        app.focus = Focus::Material;
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_material(), Some("Steel"));
        assert_eq!(app.sub_materials, vec!["Rebar"]);
        assert_eq!(app.selected_reference(), Some("Rebar UK"));
    }

    #[test]
    fn test_add_requires_positive_quantity() {
        let (_dir, mut app) = test_app();
        press(&mut app, KeyCode::F(5));
        assert!(app.calc.session().adds.is_empty());
        assert_eq!(app.status.kind, StatusKind::Warning);
    }

    #[test]
    fn test_add_rejects_overflowing_quantity() {
        let (_dir, mut app) = test_app();
        app.focus = Focus::Quantity;
        type_text(&mut app, &"9".repeat(400));
        assert_eq!(app.quantity.as_f64(), Some(f64::INFINITY));

        press(&mut app, KeyCode::F(6));
        assert!(app.calc.session().omits.is_empty());
        assert_eq!(app.status.kind, StatusKind::Warning);
    }

    #[test]
    fn test_write_failure_shown_as_error() {
        let (dir, mut app) = test_app();
        std::fs::create_dir(dir.path().join("blocked.json")).unwrap();
        app.name.value = "blocked".to_string();

        press(&mut app, KeyCode::F(2));
        assert_eq!(app.status.kind, StatusKind::Error);
        assert_eq!(app.calc.session().name, "");
    }

    #[test]
    fn test_add_and_omit_flow() {
        let (_dir, mut app) = test_app();
        app.focus = Focus::Quantity;
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "100");

        press(&mut app, KeyCode::F(5));
        press(&mut app, KeyCode::F(6));

        let totals = app.calc.update_totals();
        assert_eq!(app.calc.session().adds.len(), 1);
        assert_eq!(app.calc.session().omits.len(), 1);
        assert_eq!(totals.total_add, 100.0 * 0.12);
        assert_eq!(totals.net_change, 0.0);
        assert_eq!(app.adds_state.selected(), Some(0));
    }

    #[test]
    fn test_numeric_field_ignores_letters() {
        let (_dir, mut app) = test_app();
        app.focus = Focus::Quantity;
        type_text(&mut app, "2x.5");
        assert_eq!(app.quantity.value, "02.5");
    }

    #[test]
    fn test_use_calculated_quantity() {
        let (_dir, mut app) = test_app();
        app.focus = Focus::Dimensions;
        for value in ["2", "3", "4", "0.5"] {
            press(&mut app, KeyCode::Backspace);
            type_text(&mut app, value);
            press(&mut app, KeyCode::Down);
        }

        assert_eq!(app.calculated_quantity(), Some(12.0));
        press(&mut app, KeyCode::F(7));
        assert_eq!(app.quantity.value, "12.0000");
    }

    #[test]
    fn test_delete_selected_line() {
        let (_dir, mut app) = test_app();
        app.quantity.value = "5".to_string();
        press(&mut app, KeyCode::F(5));
        press(&mut app, KeyCode::F(5));

        app.focus = Focus::Adds;
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.calc.session().adds.len(), 1);
        press(&mut app, KeyCode::Char('d'));
        assert!(app.calc.session().adds.is_empty());
        assert_eq!(app.adds_state.selected(), None);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.status.kind, StatusKind::Warning);
    }

    #[test]
    fn test_save_without_name_warns() {
        let (_dir, mut app) = test_app();
        press(&mut app, KeyCode::F(2));
        assert_eq!(app.status.kind, StatusKind::Warning);
        assert_eq!(app.status.text, "Enter a calculation name before saving.");
    }

    #[test]
    fn test_save_and_load_through_popup() {
        let (_dir, mut app) = test_app();
        app.quantity.value = "10".to_string();
        press(&mut app, KeyCode::F(5));
        app.name.value = "demo".to_string();
        app.description.value = "slab".to_string();
        press(&mut app, KeyCode::F(2));
        assert_eq!(app.status.kind, StatusKind::Success);

        app.focus = Focus::Adds;
        press(&mut app, KeyCode::Char('d'));
        app.name.value.clear();

        press(&mut app, KeyCode::F(3));
        assert!(app.load_popup.is_some());
        press(&mut app, KeyCode::Enter);

        assert!(app.load_popup.is_none());
        assert_eq!(app.name.value, "demo");
        assert_eq!(app.description.value, "slab");
        assert_eq!(app.calc.session().adds.len(), 1);
    }

    #[test]
    fn test_load_with_nothing_saved() {
        let (_dir, mut app) = test_app();
        press(&mut app, KeyCode::F(3));
        assert!(app.load_popup.is_none());
        assert_eq!(app.status.text, "No saved calculations found.");
    }

    #[test]
    fn test_quit_keys() {
        let (_dir, mut app) = test_app();
        app.focus = Focus::Name;
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit, "q is text inside a text field");
        assert_eq!(app.name.value, "q");

        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn test_render_does_not_panic() {
        let (_dir, mut app) = test_app();
        app.quantity.value = "3".to_string();
        press(&mut app, KeyCode::F(5));

        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| ui(f, &mut app)).unwrap();

        app.name.value = "x".to_string();
        press(&mut app, KeyCode::F(2));
        press(&mut app, KeyCode::F(3));
        terminal.draw(|f| ui(f, &mut app)).unwrap();
    }
}
