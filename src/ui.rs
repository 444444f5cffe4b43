use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use crate::app::{App, FocusPane, InputMode};
use crate::floorplan::FloorPlan;
use crate::model::{ChatMessage, Role, Source};
use crate::session::EXAMPLE_PROMPTS;

const SIDEBAR_WIDTH: u16 = 26;
const SIDEBAR_COLLAPSED_WIDTH: u16 = 5;
/// Below this width the sidebar is hidden.
const SIDEBAR_MIN_TERMINAL: u16 = 100;
/// Below this width only the chat pane is shown.
const WORKSPACE_MIN_TERMINAL: u16 = 60;
const CITATION_LABEL_CHARS: usize = 20;
const INPUT_PLACEHOLDER: &str = "E.g., Design a master suite with walk-in closet...";

const ACCENT: Color = Color::Cyan;
const MUTED: Color = Color::DarkGray;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            let mut bold_text = String::new();
            let mut found_close = false;
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Short link label for a citation.
fn citation_label(title: &str) -> String {
    if title.chars().count() > CITATION_LABEL_CHARS {
        let head: String = title.chars().take(CITATION_LABEL_CHARS).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

/// Splits text into alternating runs of whitespace and non-whitespace.
fn split_words(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        if in_space.is_some_and(|prev| prev != space) {
            tokens.push(&text[start..i]);
            start = i;
        }
        in_space = Some(space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

fn push_text(row: &mut Vec<Span<'static>>, text: String, style: Style) {
    match row.last_mut() {
        Some(last) if last.style == style => last.content.to_mut().push_str(&text),
        _ => row.push(Span::styled(text, style)),
    }
}

fn trim_row_end(mut row: Vec<Span<'static>>) -> Vec<Span<'static>> {
    while let Some(last) = row.last_mut() {
        let kept = last.content.trim_end().len();
        if kept == 0 {
            row.pop();
        } else {
            last.content.to_mut().truncate(kept);
            break;
        }
    }
    row
}

/// Word-wraps a styled line into rows of at most `width` columns. The
/// transcript is drawn pre-wrapped so its row count is exact for scrolling.
fn wrap_line(line: Line<'static>, width: u16) -> Vec<Line<'static>> {
    let width = width as usize;
    if width == 0 || line.width() <= width {
        return vec![line];
    }

    let Line { style, alignment, spans } = line;
    let mut rows: Vec<Vec<Span<'static>>> = Vec::new();
    let mut row: Vec<Span<'static>> = Vec::new();
    let mut row_width = 0;

    for span in spans {
        for token in split_words(&span.content) {
            let token_width = Span::raw(token).width();
            let blank = token.chars().all(char::is_whitespace);

            if row_width + token_width > width && row_width > 0 {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
                if blank {
                    continue;
                }
            }

            if token_width > width {
                // Words longer than a row are broken between characters.
                for c in token.chars() {
                    let c_width = Span::raw(c.to_string()).width();
                    if row_width + c_width > width && row_width > 0 {
                        rows.push(std::mem::take(&mut row));
                        row_width = 0;
                    }
                    push_text(&mut row, c.to_string(), span.style);
                    row_width += c_width;
                }
            } else {
                push_text(&mut row, token.to_string(), span.style);
                row_width += token_width;
            }
        }
    }
    if !row.is_empty() || rows.is_empty() {
        rows.push(row);
    }

    rows.into_iter()
        .map(|spans| {
            let mut wrapped = Line::from(trim_row_end(spans));
            wrapped.style = style;
            wrapped.alignment = alignment;
            wrapped
        })
        .collect()
}

/// Wraps every line and returns the rows plus the first row of each line.
fn wrap_lines(lines: Vec<Line<'static>>, width: u16) -> (Vec<Line<'static>>, Vec<usize>) {
    let mut rows = Vec::new();
    let mut starts = Vec::with_capacity(lines.len());
    for line in lines {
        starts.push(rows.len());
        rows.extend(wrap_line(line, width));
    }
    (rows, starts)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_body(app, frame, body_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" ARCHITECT ", Style::default().fg(ACCENT).bold()),
        Span::styled("Suite Pro ", Style::default().fg(Color::White)),
        Span::styled("│ ", Style::default().fg(Color::Gray)),
        Span::styled(app.session.project_name().to_string(), Style::default().fg(Color::White).bold()),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(MUTED));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " ASK ",
    };

    let key_style = Style::default().bg(MUTED).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];

    if let Some(status) = &app.status {
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Yellow)));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
        return;
    }

    let hints: Vec<(&str, &str)> = match app.input_mode {
        InputMode::Editing => vec![
            ("Enter", "send"),
            ("Esc", "normal"),
            ("Tab", "focus"),
            ("Ctrl+C", "quit"),
        ],
        InputMode::Normal => {
            let mut hints = vec![("i", "ask")];
            if app.session.is_empty() && !app.is_busy() {
                hints.push(("j/k", "example"));
                hints.push(("1-4", "send example"));
            } else {
                hints.push(("j/k", "scroll"));
            }
            hints.extend([
                ("v", app.view_mode.toggle().label()),
                ("n", "new draft"),
                ("b", "sidebar"),
                ("Tab", "focus"),
                ("q", "quit"),
            ]);
            hints
        }
    };

    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_body(app: &mut App, frame: &mut Frame, area: Rect) {
    let show_sidebar = area.width >= SIDEBAR_MIN_TERMINAL;
    let show_workspace = area.width >= WORKSPACE_MIN_TERMINAL;

    let sidebar_width = match (show_sidebar, app.sidebar_open) {
        (false, _) => 0,
        (true, true) => SIDEBAR_WIDTH,
        (true, false) => SIDEBAR_COLLAPSED_WIDTH,
    };

    let [sidebar_area, main_area] = Layout::horizontal([
        Constraint::Length(sidebar_width),
        Constraint::Min(0),
    ])
    .areas(area);

    if sidebar_width > 0 {
        render_sidebar(app, frame, sidebar_area);
    } else {
        app.new_draft_area = None;
        app.sidebar_toggle_area = None;
    }

    if show_workspace {
        let [chat_area, workspace_area] = Layout::horizontal([
            Constraint::Percentage(42),
            Constraint::Percentage(58),
        ])
        .areas(main_area);
        render_chat(app, frame, chat_area);
        render_workspace(app, frame, workspace_area);
    } else {
        app.workspace_area = None;
        render_chat(app, frame, main_area);
    }
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(MUTED));
    let inner = block.inner(area);

    // Rows of the clickable entries within the sidebar
    let (lines, new_draft_row, toggle_row) = if app.sidebar_open {
        let new_draft_style = if app.is_busy() {
            Style::default().fg(MUTED)
        } else {
            Style::default().fg(Color::Black).bg(ACCENT).bold()
        };
        let lines = vec![
            Line::from(vec![
                Span::styled("ARCHITECT", Style::default().fg(ACCENT).bold()),
                Span::styled(" Suite Pro", Style::default().fg(MUTED)),
            ]),
            Line::default(),
            Line::from(Span::styled(" + New Draft [n] ", new_draft_style)),
            Line::default(),
            Line::from(Span::styled(
                "ACTIVE SESSION",
                Style::default().fg(MUTED).add_modifier(Modifier::BOLD),
            )),
            Line::from(vec![
                Span::styled("▸ ", Style::default().fg(ACCENT)),
                Span::raw(app.session.project_name().to_string()),
            ]),
            Line::default(),
            Line::from(Span::styled("« Collapse [b]", Style::default().fg(MUTED))),
        ];
        (lines, 2, 7)
    } else {
        let lines = vec![
            Line::from(Span::styled(" A", Style::default().fg(ACCENT).bold())),
            Line::default(),
            Line::from(Span::styled(" +", Style::default().fg(ACCENT))),
            Line::default(),
            Line::from(Span::styled(" »", Style::default().fg(MUTED))),
        ];
        (lines, 2, 4)
    };

    let row_area = |row: u16| {
        (row < inner.height).then(|| Rect::new(inner.x, inner.y + row, inner.width, 1))
    };
    app.new_draft_area = row_area(new_draft_row);
    app.sidebar_toggle_area = row_area(toggle_row);

    let sidebar = Paragraph::new(lines).block(block);
    frame.render_widget(sidebar, area);
}

fn render_workspace(app: &mut App, frame: &mut Frame, area: Rect) {
    app.workspace_area = Some(area);
    let plan = FloorPlan::new(app.session.current_layout(), app.view_mode)
        .focused(app.focus == FocusPane::Workspace);
    frame.render_widget(plan, area);
}

fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.session.messages() {
        match msg.role {
            Role::User => push_user_turn(&mut lines, msg),
            Role::Model => push_model_turn(&mut lines, msg),
        }
    }

    if app.is_busy() {
        lines.push(Line::from(Span::styled(
            "Architect:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Architect is thinking{}", dots),
            Style::default().fg(MUTED).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn push_user_turn(lines: &mut Vec<Line<'static>>, msg: &ChatMessage) {
    let style = Style::default().fg(ACCENT);
    lines.push(
        Line::from(Span::styled("You:", style.add_modifier(Modifier::BOLD)))
            .alignment(Alignment::Right),
    );
    for text in msg.text.lines() {
        lines.push(Line::from(Span::styled(text.to_string(), style)).alignment(Alignment::Right));
    }
    lines.push(Line::default());
}

fn push_model_turn(lines: &mut Vec<Line<'static>>, msg: &ChatMessage) {
    lines.push(Line::from(Span::styled(
        "Architect:",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )));
    for text in msg.text.lines() {
        lines.push(parse_markdown_line(text));
    }

    if msg.layout.is_some() {
        lines.push(Line::from(Span::styled(
            "◆ Visual generated in workspace",
            Style::default().fg(Color::Green).add_modifier(Modifier::ITALIC),
        )));
    }

    if !msg.sources.is_empty() {
        lines.push(Line::from(Span::styled(
            "Sources & Grounding",
            Style::default().fg(MUTED).add_modifier(Modifier::BOLD),
        )));
        lines.extend(msg.sources.iter().map(source_line));
    }

    lines.push(Line::default());
}

fn source_line(source: &Source) -> Line<'static> {
    Line::from(vec![
        Span::styled(" ↗ ", Style::default().fg(ACCENT)),
        Span::styled(
            citation_label(&source.title),
            Style::default().fg(ACCENT).add_modifier(Modifier::UNDERLINED),
        ),
        Span::raw(" "),
        Span::styled(source.url.clone(), Style::default().fg(MUTED)),
    ])
}

/// Lines above the first example prompt.
const EXAMPLE_HEADER_LINES: usize = 3;

fn example_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            "How can I help you design today?",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Describe a space, or pick an example:",
            Style::default().fg(MUTED),
        )),
        Line::default(),
    ];

    for (i, prompt) in EXAMPLE_PROMPTS.iter().enumerate() {
        let selected = i == app.selected_example && app.input_mode == InputMode::Normal;
        let style = if selected {
            Style::default().fg(Color::Black).bg(ACCENT).bold()
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(Span::styled(format!(" {}. {} ", i + 1, prompt), style)));
    }

    lines
}

/// Screen rect of transcript rows `first..end`, clipped to what is scrolled into view.
fn visible_rows(first: usize, end: usize, scroll: usize, inner: Rect) -> Option<Rect> {
    let top = first.max(scroll);
    let bottom = end.min(scroll + inner.height as usize);
    (top < bottom).then(|| {
        Rect::new(
            inner.x,
            inner.y + (top - scroll) as u16,
            inner.width,
            (bottom - top) as u16,
        )
    })
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [transcript_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    app.chat_area = Some(transcript_area);

    let chat_focused = app.focus == FocusPane::Chat;
    let border_color = if chat_focused { ACCENT } else { MUTED };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Design Console: {} ", app.gemini.model()));

    let inner = chat_block.inner(transcript_area);

    let showing_examples = app.session.is_empty() && !app.is_busy();
    let lines = if showing_examples {
        example_lines(app)
    } else {
        transcript_lines(app)
    };

    let (rows, starts) = wrap_lines(lines, inner.width);
    let total_lines = rows.len().min(u16::MAX as usize) as u16;
    app.update_transcript_metrics(total_lines, inner.height);

    app.example_areas.clear();
    if showing_examples {
        for i in 0..EXAMPLE_PROMPTS.len() {
            let first = starts[EXAMPLE_HEADER_LINES + i];
            let end = starts
                .get(EXAMPLE_HEADER_LINES + i + 1)
                .copied()
                .unwrap_or(rows.len());
            let visible = visible_rows(first, end, app.chat_scroll as usize, inner);
            app.example_areas.push(visible.unwrap_or_default());
        }
    }

    let transcript = Paragraph::new(Text::from(rows))
        .block(chat_block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(transcript, transcript_area);

    if app.chat_total_lines > app.chat_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));
        let mut scrollbar_state = ScrollbarState::new(app.chat_total_lines as usize)
            .position(app.chat_scroll as usize);
        frame.render_stateful_widget(
            scrollbar,
            transcript_area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }

    render_input(app, frame, input_area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { MUTED };
    let title = if app.is_busy() { " Ask (waiting for reply) " } else { " Ask " };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll keeps the cursor inside the box
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() {
        Paragraph::new(Span::styled(INPUT_PLACEHOLDER, Style::default().fg(MUTED)))
    } else {
        let visible_text: String = app
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(ACCENT))
    };

    frame.render_widget(input.block(input_block), area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}
