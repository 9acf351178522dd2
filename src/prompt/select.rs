// Prompt module
// 対話的な単一選択プロンプト

use crossterm::cursor::{self, MoveToColumn, MoveUp};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType};
use crossterm::{execute, queue};
use std::io::{self, IsTerminal, Stderr, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("selection cancelled")]
    Cancelled,

    #[error("interactive selection requires a TTY; stdin is not a terminal")]
    NotATerminal,

    #[error("nothing to choose from")]
    NoOptions,

    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

/// Asks the user to pick one of `options`.
pub trait Prompt {
    fn select(&self, label: &str, options: &[String]) -> Result<String, PromptError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAction {
    Redraw,
    Choose(usize),
    Cancel,
    Ignore,
}

/// Cursor state of a select list, independent of the terminal.
#[derive(Debug, Clone)]
pub struct SelectState {
    index: usize,
    len: usize,
}

impl SelectState {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> SelectAction {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return SelectAction::Cancel;
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                // wrap around at the top
                self.index = if self.index == 0 {
                    self.len - 1
                } else {
                    self.index - 1
                };
                SelectAction::Redraw
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.index = (self.index + 1) % self.len;
                SelectAction::Redraw
            }
            KeyCode::Enter => SelectAction::Choose(self.index),
            KeyCode::Esc | KeyCode::Char('q') => SelectAction::Cancel,
            _ => SelectAction::Ignore,
        }
    }
}

/// Raw mode and a hidden cursor for as long as the guard lives.
struct RawTerminal;

impl RawTerminal {
    fn enter(out: &mut Stderr) -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = RawTerminal;
        execute!(out, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), cursor::Show);
    }
}

/// Arrow-key list rendered inline on stderr, leaving stdout to command output.
#[derive(Debug, Default)]
pub struct TerminalSelect;

impl Prompt for TerminalSelect {
    fn select(&self, label: &str, options: &[String]) -> Result<String, PromptError> {
        if options.is_empty() {
            return Err(PromptError::NoOptions);
        }
        if !io::stdin().is_terminal() {
            return Err(PromptError::NotATerminal);
        }

        let mut out = io::stderr();
        let index = {
            let _raw = RawTerminal::enter(&mut out)?;
            run_select(&mut out, label, options)?
        };
        Ok(options[index].clone())
    }
}

fn run_select<W: Write>(out: &mut W, label: &str, options: &[String]) -> Result<usize, PromptError> {
    let mut state = SelectState::new(options.len());
    draw(out, label, options, &state, false)?;

    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match state.handle_key(&key) {
            SelectAction::Redraw => draw(out, label, options, &state, true)?,
            SelectAction::Choose(index) => {
                queue!(out, Print("\r\n"))?;
                out.flush()?;
                return Ok(index);
            }
            SelectAction::Cancel => {
                queue!(out, Print("\r\n"))?;
                out.flush()?;
                return Err(PromptError::Cancelled);
            }
            SelectAction::Ignore => {}
        }
    }
}

fn draw<W: Write>(
    out: &mut W,
    label: &str,
    options: &[String],
    state: &SelectState,
    redraw: bool,
) -> io::Result<()> {
    if redraw {
        // the label line plus one line per option
        queue!(out, MoveUp(options.len() as u16 + 1))?;
    }
    queue!(
        out,
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(format!("? {} (↑/↓, enter)\r\n", label))
    )?;
    for (idx, option) in options.iter().enumerate() {
        queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        if idx == state.index() {
            queue!(
                out,
                SetForegroundColor(Color::Cyan),
                Print(format!("> {}", option)),
                ResetColor
            )?;
        } else {
            queue!(out, Print(format!("  {}", option)))?;
        }
        queue!(out, Print("\r\n"))?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_move_and_wrap() {
        let mut state = SelectState::new(3);
        assert_eq!(state.handle_key(&key(KeyCode::Up)), SelectAction::Redraw);
        assert_eq!(state.index(), 2);
        state.handle_key(&key(KeyCode::Down));
        assert_eq!(state.index(), 0);
        state.handle_key(&key(KeyCode::Char('j')));
        state.handle_key(&key(KeyCode::Char('j')));
        assert_eq!(state.index(), 2);
        state.handle_key(&key(KeyCode::Char('k')));
        assert_eq!(state.index(), 1);
    }

    #[test]
    fn enter_chooses_current_index() {
        let mut state = SelectState::new(2);
        state.handle_key(&key(KeyCode::Down));
        assert_eq!(state.handle_key(&key(KeyCode::Enter)), SelectAction::Choose(1));
    }

    #[test]
    fn escape_and_ctrl_c_cancel() {
        let mut state = SelectState::new(2);
        assert_eq!(state.handle_key(&key(KeyCode::Esc)), SelectAction::Cancel);
        assert_eq!(state.handle_key(&key(KeyCode::Char('q'))), SelectAction::Cancel);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(state.handle_key(&ctrl_c), SelectAction::Cancel);
        assert_eq!(state.handle_key(&key(KeyCode::Char('c'))), SelectAction::Ignore);
    }

    #[test]
    fn draw_marks_current_option() {
        let options = vec!["paper.jar".to_string(), "vanilla.jar".to_string()];
        let mut state = SelectState::new(options.len());
        state.handle_key(&key(KeyCode::Down));

        let mut buf = Vec::new();
        draw(&mut buf, "Select a jar", &options, &state, false).unwrap();
        let text = String::from_utf8_lossy(&buf);

        assert!(text.contains("? Select a jar"));
        assert!(text.contains("  paper.jar"));
        assert!(text.contains("> vanilla.jar"));
    }

    #[test]
    fn empty_options_are_rejected() {
        let result = TerminalSelect.select("Select", &[]);
        assert!(matches!(result, Err(PromptError::NoOptions)));
    }
}
