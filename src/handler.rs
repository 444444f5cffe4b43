use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, FocusPane, InputMode};
use crate::session::EXAMPLE_PROMPTS;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => {
            if app.input_mode == InputMode::Editing {
                insert_text(app, &text);
            }
        }
        AppEvent::Resize => app.follow_transcript = true,
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_consultation().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    let examples_visible = app.session.is_empty() && !app.is_busy();

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.focus = FocusPane::Chat;
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Enter => {
            if examples_visible && app.focus == FocusPane::Chat {
                app.submit_example(app.selected_example);
            } else {
                app.focus = FocusPane::Chat;
                app.input_mode = InputMode::Editing;
            }
        }
        KeyCode::Char(c @ '1'..='9') if examples_visible => {
            let index = c as usize - '1' as usize;
            if index < EXAMPLE_PROMPTS.len() {
                app.selected_example = index;
                app.submit_example(index);
            }
        }

        KeyCode::Tab => app.cycle_focus(),

        KeyCode::Char('j') | KeyCode::Down => {
            if examples_visible {
                app.example_down();
            } else {
                app.scroll_down(1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if examples_visible {
                app.example_up();
            } else {
                app.scroll_up(1);
            }
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(app.chat_height / 2);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(app.chat_height / 2);
        }
        KeyCode::PageDown => app.scroll_down(app.chat_height.max(1)),
        KeyCode::PageUp => app.scroll_up(app.chat_height.max(1)),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),

        KeyCode::Char('v') => app.toggle_view_mode(),
        KeyCode::Char('n') => app.new_draft(),
        KeyCode::Char('b') => app.toggle_sidebar(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit_input();
        }
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.cycle_focus();
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

/// Inserts pasted text at the cursor. The prompt is a single line, so line
/// breaks become spaces.
fn insert_text(app: &mut App, text: &str) {
    let cleaned: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect();
    let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
    app.input.insert_str(byte_pos, &cleaned);
    app.input_cursor += cleaned.chars().count();
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn hit(area: Option<Rect>, x: u16, y: u16) -> bool {
    area.map(|r| point_in_rect(x, y, r)).unwrap_or(false)
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_chat = hit(app.chat_area, x, y);
    let in_workspace = hit(app.workspace_area, x, y);

    match mouse.kind {
        MouseEventKind::ScrollDown if in_chat => app.scroll_down(3),
        MouseEventKind::ScrollUp if in_chat => app.scroll_up(3),
        MouseEventKind::Down(MouseButton::Left) if hit(app.new_draft_area, x, y) => app.new_draft(),
        MouseEventKind::Down(MouseButton::Left) if hit(app.sidebar_toggle_area, x, y) => {
            app.toggle_sidebar();
        }
        MouseEventKind::Down(button) => {
            if in_chat {
                app.focus = FocusPane::Chat;
                let clicked_example = app
                    .example_areas
                    .iter()
                    .position(|area| point_in_rect(x, y, *area));
                if let (MouseButton::Left, Some(index)) = (button, clicked_example) {
                    app.selected_example = index;
                    app.submit_example(index);
                }
            } else if in_workspace {
                app.focus = FocusPane::Workspace;
            }
        }
        _ => {}
    }
}
