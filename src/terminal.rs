// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based scanner viewfinder
//!
//! Shows the current source image with the viewfinder overlay composited on
//! top, rendered with Unicode half-block characters for improved vertical
//! resolution. Frames are decoded on the analysis thread while the UI
//! thread pumps results into the scan controller.

use crate::app::frame_processor::{
    AnalysisState, BarcodeFormat, CodeAnalyzer, QrDecoder, ResultPoint,
};
use crate::app::scan_controller::{ScanController, ScanState, scan_channel};
use crate::app::viewfinder::canvas::{Canvas, PixelCanvas};
use crate::app::viewfinder::points::ResultPointTracker;
use crate::app::viewfinder::{FramingRect, Invalidation, ViewfinderOverlay};
use crate::backends::camera::{AnalysisExecutor, ImageSource};
use crate::backends::feedback::BeepManager;
use crate::config::Config;
use crate::constants::CAPTURE_INTERVAL;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::info;

/// Run the terminal viewfinder over the given images
pub fn run(config: Config, images: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    // Load before touching the terminal so errors print normally
    let source = ImageSource::open(images)?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, config, source);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

type LastResult = Arc<Mutex<Option<(String, BarcodeFormat)>>>;

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
    source: ImageSource,
) -> Result<(), Box<dyn std::error::Error>> {
    let now = Instant::now();
    let analysis = AnalysisState::new();
    let tracker = Arc::new(ResultPointTracker::new());
    let (sender, mut events) = scan_channel();

    let decoder =
        QrDecoder::new(config.hints.clone()).with_max_dimension(config.max_decode_dimension);
    let mut analyzer = CodeAnalyzer::new(decoder, Arc::clone(&analysis))
        .with_tracker(Arc::clone(&tracker))
        .with_listener(sender);
    let mut executor = AnalysisExecutor::spawn(move |frame| {
        analyzer.analyze(frame);
    });
    let mut capture = source.start_loop(executor.submitter(), CAPTURE_INTERVAL);

    let last_result: LastResult = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&last_result);
    let overlay = ViewfinderOverlay::new(config.style.clone(), tracker, now);
    let mut controller = ScanController::new(
        analysis,
        overlay,
        Box::new(BeepManager::terminal(config.feedback)),
    )
    .with_listener(move |text: &str, _: &[ResultPoint], format: BarcodeFormat| {
        if let Ok(mut slot) = sink.lock() {
            *slot = Some((text.to_string(), format));
        }
    });

    info!(images = source.len(), "Terminal viewfinder started");

    let mut view = ViewState::default();
    let mut show_help = false;
    let mut status_message = build_status_message(&controller, &source);

    loop {
        let now = Instant::now();

        // Apply results the analysis thread produced since the last tick
        if controller.pump(&mut events, now) > 0 {
            let found = last_result.lock().ok().and_then(|mut slot| slot.take());
            if let Some((text, format)) = found {
                status_message = format!("[{}] {} | 'r' rescan | 'q' quit", format, text);
            }
            if let Some(image) = source.current_image() {
                controller.overlay_mut().draw_result_bitmap(image.clone());
            }
        }
        view.collect(controller.overlay_mut());

        let size = terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height.saturating_sub(1));
        if view.needs_paint(area, now) {
            if let Some(image) = source.current_image() {
                view.paint(controller.overlay_mut(), image, area, now);
            }
        }

        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let camera_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };
            f.render_widget(&view, camera_area);

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            let status = StatusBar {
                message: &status_message,
            };
            f.render_widget(status, status_area);
        })?;

        // Handle input with timeout for animation updates
        if event::poll(Duration::from_millis(16))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Ctrl+C to quit
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Char('r') => {
                    show_help = false;
                    controller.start_scan(Instant::now());
                    status_message = build_status_message(&controller, &source);
                }
                KeyCode::Char('n') => {
                    show_help = false;
                    source.advance();
                    view.invalidate();
                    status_message = build_status_message(&controller, &source);
                }
                KeyCode::Char('h') => {
                    show_help = !show_help;
                    status_message = if show_help {
                        build_help_message()
                    } else {
                        build_status_message(&controller, &source)
                    };
                }
                _ => {}
            }
        }
    }

    capture.stop();
    executor.shutdown();
    info!(outstanding = source.outstanding(), "Terminal viewfinder stopped");

    Ok(())
}

fn build_status_message(controller: &ScanController, source: &ImageSource) -> String {
    let name = source
        .current_path()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let state = match controller.state() {
        ScanState::Scanning => "Scanning",
        ScanState::Stopped => "Stopped",
    };
    let mut msg = format!("{} {}", state, name);
    if source.len() > 1 {
        msg.push_str(" | 'n' next image");
    }
    msg.push_str(" | 'r' rescan | 'h' help | 'q' quit");
    msg
}

fn build_help_message() -> String {
    String::from("r: Rescan | n: Next image | h: Toggle help | q/Ctrl+C: Quit")
}

/// Composited frame plus the bookkeeping for when to repaint it
#[derive(Default)]
struct ViewState {
    frame: Option<RgbaImage>,
    /// Source scaled to the frame size, without the overlay
    scaled: Option<RgbaImage>,
    /// Terminal cells the frame was composed for
    area: Rect,
    pending: Option<Invalidation>,
    last_paint: Option<Instant>,
    dirty: bool,
}

impl ViewState {
    /// Merge the overlay's repaint request; a full repaint wins over a region
    fn collect(&mut self, overlay: &mut ViewfinderOverlay) {
        match overlay.take_invalidation() {
            Some(Invalidation::Full) => self.pending = Some(Invalidation::Full),
            Some(region) if self.pending.is_none() => self.pending = Some(region),
            _ => {}
        }
    }

    fn invalidate(&mut self) {
        self.dirty = true;
    }

    fn needs_paint(&self, area: Rect, now: Instant) -> bool {
        if self.dirty || self.frame.is_none() || self.area != area {
            return true;
        }
        match self.pending {
            Some(Invalidation::Full) => true,
            Some(Invalidation::Region { delay, .. }) => self
                .last_paint
                .is_none_or(|last| now.saturating_duration_since(last) >= delay),
            None => false,
        }
    }

    /// Region still valid to repaint on its own, if the layout is unchanged
    fn pending_region(&self, area: Rect) -> Option<FramingRect> {
        match self.pending {
            Some(Invalidation::Region { rect, .. })
                if !self.dirty && self.area == area && self.scaled.is_some() =>
            {
                Some(rect)
            }
            _ => None,
        }
    }

    /// Repaint the overlay on the current frame, only as much as requested
    fn paint(
        &mut self,
        overlay: &mut ViewfinderOverlay,
        source: &RgbaImage,
        area: Rect,
        now: Instant,
    ) {
        let region = self.pending_region(area);
        self.area = area;
        self.dirty = false;
        self.pending = None;
        self.last_paint = Some(now);

        let canvas = match (region, self.frame.take()) {
            (Some(rect), Some(frame)) => self.restore_region(frame, rect),
            _ => self.rescale(source, area),
        };
        let Some(mut canvas) = canvas else {
            self.frame = None;
            return;
        };

        if let Some(rect) = region {
            canvas.clip_to(rect.to_rect_f());
        }
        overlay.set_bounds(canvas.width(), canvas.height());
        overlay.paint(&mut canvas, now);
        self.frame = Some(canvas.into_image());
        self.collect(overlay);
    }

    /// Scale the source to the area (two pixels per cell vertically)
    fn rescale(&mut self, source: &RgbaImage, area: Rect) -> Option<PixelCanvas> {
        let (width, height) = fit_dimensions(source.width(), source.height(), area);
        if width == 0 || height == 0 {
            self.scaled = None;
            return None;
        }
        let scaled = imageops::resize(source, width, height, FilterType::Triangle);
        let canvas = PixelCanvas::from_image(scaled.clone());
        self.scaled = Some(scaled);
        canvas
    }

    /// Put the unpainted source back inside `rect`; the rest of the frame is kept
    fn restore_region(&self, mut frame: RgbaImage, rect: FramingRect) -> Option<PixelCanvas> {
        let scaled = self.scaled.as_ref()?;
        let x = rect.left.max(0) as u32;
        let y = rect.top.max(0) as u32;
        let width = (rect.right.max(0) as u32).min(scaled.width()).saturating_sub(x);
        let height = (rect.bottom.max(0) as u32).min(scaled.height()).saturating_sub(y);
        if width > 0 && height > 0 {
            let patch = imageops::crop_imm(scaled, x, y, width, height).to_image();
            imageops::replace(&mut frame, &patch, x as i64, y as i64);
        }
        PixelCanvas::from_image(frame)
    }
}

/// Largest pixel size with the source's aspect ratio that fits `area`
fn fit_dimensions(src_width: u32, src_height: u32, area: Rect) -> (u32, u32) {
    if src_width == 0 || src_height == 0 {
        return (0, 0);
    }
    let aspect = src_width as f64 / src_height as f64;
    let term_width = area.width as f64;
    let term_height = (area.height as u32 * 2) as f64;

    if term_width / term_height > aspect {
        // Terminal is wider - fit to height
        ((term_height * aspect) as u32, term_height as u32)
    } else {
        // Terminal is taller - fit to width
        (term_width as u32, (term_width / aspect) as u32)
    }
}

impl Widget for &ViewState {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            let msg = "Waiting for frames...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, ratatui::style::Style::default());
            }
            return;
        };

        let display_width = frame.width() as u16;
        let display_height = (frame.height() / 2) as u16;

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        // Each terminal cell shows two vertical pixels:
        // upper half (▀) in fg, lower half in bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;
                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let top = frame.get_pixel(tx as u32, ty as u32 * 2);
                let bottom = frame.get_pixel(tx as u32, ty as u32 * 2 + 1);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(Color::Rgb(top[0], top[1], top[2]));
                    cell.set_bg(Color::Rgb(bottom[0], bottom[1], bottom[2]));
                }
            }
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}
