//! Terminal front-end for the measurement loop
//!
//! Renders the depth view to the terminal using Unicode half-block
//! characters and turns keyboard and mouse events into loop commands.
//! Input and display share a [`Viewport`] so mouse cells map back to frame
//! pixels.

use crate::colormap::DepthColormap;
use crate::overlay::{Overlay, Rgb, TextLine};
use crate::snapshot::SnapshotWriter;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use depthmeasure_core::{
    Command, DepthSample, FrameSink, FrameView, InputSource, Pixel, Resolution, Result,
};
use ratatui::{
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
    Terminal,
};
use std::cell::Cell;
use std::io::{self, stdout, Stdout};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cursor step for arrow keys, multiplied when shift is held
const CURSOR_STEP: i64 = 1;
const CURSOR_FAST_STEP: i64 = 10;

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb[0], rgb[1], rgb[2])
}

/// Placement of a frame inside a terminal area
///
/// Each cell shows one column of the frame and two rows, the upper one as
/// the foreground of `▀` and the lower one as its background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub resolution: Resolution,
    pub origin: (u16, u16),
    pub size: (u16, u16),
    x_scale: f64,
    y_scale: f64,
}

impl Viewport {
    /// Fit a frame into `area` keeping its aspect ratio, centred
    pub fn fit(resolution: Resolution, area: Rect) -> Option<Self> {
        if resolution.is_empty() || area.width == 0 || area.height == 0 {
            return None;
        }

        let frame_aspect = resolution.width as f64 / resolution.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height as f64) * 2.0;

        let (width, height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            ((h * frame_aspect) as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            (w as u16, (w / frame_aspect / 2.0) as u16)
        };
        if width == 0 || height == 0 {
            return None;
        }

        Some(Self {
            resolution,
            origin: (
                area.x + area.width.saturating_sub(width) / 2,
                area.y + area.height.saturating_sub(height) / 2,
            ),
            size: (width, height),
            x_scale: resolution.width as f64 / width as f64,
            y_scale: resolution.height as f64 / (height as f64 * 2.0),
        })
    }

    fn contains_cell(&self, column: u16, row: u16) -> bool {
        column >= self.origin.0
            && row >= self.origin.1
            && column < self.origin.0 + self.size.0
            && row < self.origin.1 + self.size.1
    }

    /// Frame pixel shown in the upper half of a cell
    pub fn to_pixel(&self, column: u16, row: u16) -> Option<Pixel> {
        self.half_to_pixel(column, row, 0)
    }

    fn half_to_pixel(&self, column: u16, row: u16, half: u16) -> Option<Pixel> {
        if !self.contains_cell(column, row) {
            return None;
        }
        let tx = (column - self.origin.0) as f64;
        let ty = ((row - self.origin.1) * 2 + half) as f64;
        Some(Pixel::new(
            ((tx * self.x_scale) as u32).min(self.resolution.width - 1),
            ((ty * self.y_scale) as u32).min(self.resolution.height - 1),
        ))
    }

    /// Cell showing a frame pixel
    pub fn to_cell(&self, pixel: Pixel) -> Option<(u16, u16)> {
        if !self.resolution.contains(pixel) {
            return None;
        }
        let column = self.origin.0 + (pixel.u as f64 / self.x_scale) as u16;
        let row = self.origin.1 + (pixel.v as f64 / (self.y_scale * 2.0)) as u16;
        self.contains_cell(column, row).then_some((column, row))
    }
}

type SharedViewport = Rc<Cell<Option<Viewport>>>;

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    MoveCursor { du: i64, dv: i64 },
    SelectAtCursor,
    Command(Command),
    Ignore,
}

/// Map a key event to an action
pub fn map_key(key: KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Ignore;
    }
    let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
        CURSOR_FAST_STEP
    } else {
        CURSOR_STEP
    };

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyAction::Command(Command::Quit)
        }
        KeyCode::Left | KeyCode::Char('h') => KeyAction::MoveCursor { du: -step, dv: 0 },
        KeyCode::Right | KeyCode::Char('l') => KeyAction::MoveCursor { du: step, dv: 0 },
        KeyCode::Up | KeyCode::Char('k') => KeyAction::MoveCursor { du: 0, dv: -step },
        KeyCode::Down | KeyCode::Char('j') => KeyAction::MoveCursor { du: 0, dv: step },
        KeyCode::Char('H') => KeyAction::MoveCursor { du: -CURSOR_FAST_STEP, dv: 0 },
        KeyCode::Char('L') => KeyAction::MoveCursor { du: CURSOR_FAST_STEP, dv: 0 },
        KeyCode::Char('K') => KeyAction::MoveCursor { du: 0, dv: -CURSOR_FAST_STEP },
        KeyCode::Char('J') => KeyAction::MoveCursor { du: 0, dv: CURSOR_FAST_STEP },
        KeyCode::Enter | KeyCode::Char(' ') => KeyAction::SelectAtCursor,
        KeyCode::Char('u') => KeyAction::Command(Command::Undo),
        KeyCode::Char('r') => KeyAction::Command(Command::Reset),
        KeyCode::Char('s') => KeyAction::Command(Command::Snapshot),
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Command(Command::Quit),
        _ => KeyAction::Ignore,
    }
}

/// Keyboard and mouse input read from the terminal
pub struct TerminalInput {
    resolution: Resolution,
    cursor: Pixel,
    viewport: SharedViewport,
    frame_interval: Duration,
}

impl TerminalInput {
    fn new(resolution: Resolution, viewport: SharedViewport, frame_interval: Duration) -> Self {
        Self {
            resolution,
            cursor: resolution.center(),
            viewport,
            frame_interval,
        }
    }

    /// Apply one terminal event, returning the command it produces
    pub fn handle_event(&mut self, event: Event) -> Option<Command> {
        match event {
            Event::Key(key) => match map_key(key) {
                KeyAction::MoveCursor { du, dv } => {
                    self.cursor = self.cursor.offset_clamped(
                        du,
                        dv,
                        self.resolution.width,
                        self.resolution.height,
                    );
                    None
                }
                KeyAction::SelectAtCursor => Some(Command::Select(self.cursor)),
                KeyAction::Command(command) => Some(command),
                KeyAction::Ignore => None,
            },
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => None,
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Option<Command> {
        let pixel = self.viewport.get()?.to_pixel(mouse.column, mouse.row)?;
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                self.cursor = pixel;
                None
            }
            MouseEventKind::Down(MouseButton::Left) => {
                self.cursor = pixel;
                Some(Command::Select(pixel))
            }
            _ => None,
        }
    }
}

impl InputSource for TerminalInput {
    fn cursor(&self) -> Option<Pixel> {
        Some(self.cursor)
    }

    /// Wait up to one frame interval, then drain events until one yields a command
    fn poll_command(&mut self) -> Result<Option<Command>> {
        let mut wait = self.frame_interval;
        while event::poll(wait)? {
            wait = Duration::ZERO;
            if let Some(command) = self.handle_event(event::read()?) {
                debug!(?command, "Terminal command");
                return Ok(Some(command));
            }
        }
        Ok(None)
    }
}

/// Widget that renders the depth view using half-block characters
pub struct DepthWidget<'a> {
    pub view: &'a FrameView<'a>,
    pub viewport: Viewport,
}

impl DepthWidget<'_> {
    fn render_depth(&self, buf: &mut Buffer) {
        let (width, height) = self.viewport.size;
        let mut samples: Vec<(u16, u16, DepthSample, DepthSample)> =
            Vec::with_capacity(width as usize * height as usize);
        for ty in 0..height {
            for tx in 0..width {
                let column = self.viewport.origin.0 + tx;
                let row = self.viewport.origin.1 + ty;
                let (Some(top), Some(bottom)) = (
                    self.viewport.half_to_pixel(column, row, 0),
                    self.viewport.half_to_pixel(column, row, 1),
                ) else {
                    continue;
                };
                samples.push((
                    column,
                    row,
                    self.view.depth.sample_at(top),
                    self.view.depth.sample_at(bottom),
                ));
            }
        }

        let colormap = DepthColormap::fit(samples.iter().flat_map(|(_, _, t, b)| [t, b]))
            .unwrap_or(DepthColormap::new(0.0, 1.0));
        for (column, row, top, bottom) in &samples {
            if let Some(cell) = buf.cell_mut((*column, *row)) {
                cell.set_char('▀');
                cell.set_fg(color(colormap.color_for(top)));
                cell.set_bg(color(colormap.color_for(bottom)));
            }
        }
    }

    fn render_overlay(&self, overlay: &Overlay, buf: &mut Buffer) {
        if let Some((a, b)) = overlay.segment {
            if let (Some(start), Some(end)) = (self.viewport.to_cell(a), self.viewport.to_cell(b)) {
                for (column, row) in cell_line(start, end) {
                    if let Some(cell) = buf.cell_mut((column, row)) {
                        cell.set_char('·');
                        cell.set_fg(color(crate::overlay::SEGMENT_COLOR));
                    }
                }
            }
        }

        for marker in &overlay.markers {
            let Some((column, row)) = self.viewport.to_cell(marker.pixel) else {
                continue;
            };
            if let Some(cell) = buf.cell_mut((column, row)) {
                cell.set_char('●');
                cell.set_fg(color(marker.color));
            }
            let label_column = column.saturating_add(1);
            let label_row = row.saturating_sub(1);
            if buf.area.contains((label_column, label_row).into()) {
                buf.set_string(
                    label_column,
                    label_row,
                    &marker.label,
                    Style::default().fg(color(marker.color)),
                );
            }
        }

        if let Some(crosshair) = overlay.crosshair {
            if let Some((column, row)) = self.viewport.to_cell(crosshair.pixel) {
                if let Some(cell) = buf.cell_mut((column, row)) {
                    cell.set_char('+');
                    cell.set_fg(color(crosshair.color));
                }
            }
        }
    }
}

impl Widget for &DepthWidget<'_> {
    fn render(self, _area: Rect, buf: &mut Buffer) {
        self.render_depth(buf);
        self.render_overlay(&Overlay::from_view(self.view), buf);
    }
}

/// Cells on the straight line between two cells, both ends included
fn cell_line(start: (u16, u16), end: (u16, u16)) -> Vec<(u16, u16)> {
    let dx = end.0 as i32 - start.0 as i32;
    let dy = end.1 as i32 - start.1 as i32;
    let steps = dx.abs().max(dy.abs());
    if steps == 0 {
        return vec![start];
    }
    (0..=steps)
        .map(|i| {
            let t = i as f32 / steps as f32;
            (
                (start.0 as f32 + dx as f32 * t).round() as u16,
                (start.1 as f32 + dy as f32 * t).round() as u16,
            )
        })
        .collect()
}

/// Status bar widget
pub struct StatusBar<'a> {
    pub line: &'a TextLine,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.line.text.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(color(self.line.color)).bg(Color::DarkGray),
        );
    }
}

/// Rows reserved below the frame for status lines
const STATUS_ROWS: u16 = 3;

/// Draws frames to the terminal; restores the terminal when dropped
pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    viewport: SharedViewport,
    snapshots: SnapshotWriter,
}

impl TerminalDisplay {
    fn new(viewport: SharedViewport, snapshots: SnapshotWriter) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
            disable_raw_mode().ok();
            return Err(err.into());
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self {
            terminal,
            viewport,
            snapshots,
        })
    }

    fn restore(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            warn!(%err, "Failed to restore terminal");
        }
    }
}

impl FrameSink for TerminalDisplay {
    fn present(&mut self, view: &FrameView<'_>) -> Result<()> {
        let overlay = Overlay::from_view(view);
        let shared = Rc::clone(&self.viewport);

        self.terminal.draw(|f| {
            let area = f.area();
            let frame_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(STATUS_ROWS),
            };

            let viewport = Viewport::fit(view.depth.resolution(), frame_area);
            shared.set(viewport);
            if let Some(viewport) = viewport {
                f.render_widget(&DepthWidget { view, viewport }, frame_area);
            }

            let first_status_row = area.y + frame_area.height;
            for (i, line) in overlay.lines.iter().take(STATUS_ROWS as usize).enumerate() {
                let row = first_status_row + i as u16;
                if row >= area.y + area.height {
                    break;
                }
                f.render_widget(StatusBar { line }, Rect::new(area.x, row, area.width, 1));
            }
        })?;
        Ok(())
    }

    fn save_snapshot(&mut self, view: &FrameView<'_>) -> Result<PathBuf> {
        self.snapshots.save(view)
    }
}

/// Enter the terminal UI for a frame of the given size
///
/// The returned display restores the terminal when dropped.
pub fn open(
    resolution: Resolution,
    frame_interval: Duration,
    snapshots: SnapshotWriter,
) -> Result<(TerminalInput, TerminalDisplay)> {
    let viewport: SharedViewport = Rc::new(Cell::new(None));
    let display = TerminalDisplay::new(Rc::clone(&viewport), snapshots)?;
    let input = TerminalInput::new(resolution, viewport, frame_interval);
    Ok((input, display))
}
