use std::io;

use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// A raster surface the renderer paints into. Coordinates are physical
/// pixels; what a physical pixel is (a canvas cell, a framebuffer texel)
/// is the implementation's business.
pub trait Surface {
    /// fill a w*h rectangle of physical pixels with origin (x, y)
    fn fill_rect(
        &mut self,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        colour: Color,
    ) -> Result<(), io::Error>;

    /// flush the finished frame to the output device
    fn present(&mut self) -> Result<(), io::Error>;
}

/// One frame of core pixel state: one byte per pixel, row-major, nonzero
/// means lit. A view only stays valid until the core's next step, so the
/// scheduler rebuilds one from the core every frame rather than keeping
/// this around.
#[derive(Debug)]
pub struct FrameBuffer<'a> {
    bytes: &'a [u8],
    width: usize,
    height: usize,
}

impl<'a> FrameBuffer<'a> {
    /// wrap a core's framebuffer slice. the core promised width*height
    /// bytes; anything else is a core fault and fails the frame
    pub fn new(bytes: &'a [u8], width: usize, height: usize) -> Result<FrameBuffer<'a>, io::Error> {
        if bytes.len() != width * height {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "framebuffer is {} bytes for a {}x{} display",
                    bytes.len(),
                    width,
                    height
                ),
            ));
        }
        Ok(FrameBuffer {
            bytes,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    pub fn lit(&self, x: usize, y: usize) -> bool {
        self.bytes[self.index(x, y)] != 0
    }
}

/// Blits a decoded frame onto a surface: every logical pixel becomes a
/// scale x scale block at (x*scale, y*scale), foreground if lit, background
/// if not. Always repaints the full grid; there is no dirty tracking.
pub struct Renderer {
    scale: usize,
    foreground: Color,
    background: Color,
}

impl Renderer {
    pub fn new(scale: usize, foreground: Color, background: Color) -> Renderer {
        assert!(scale > 0, "scale factor must be at least 1");
        Renderer {
            scale,
            foreground,
            background,
        }
    }

    pub fn paint(&self, frame: &FrameBuffer, surface: &mut impl Surface) -> Result<(), io::Error> {
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                let colour = if frame.lit(x, y) {
                    self.foreground
                } else {
                    self.background
                };
                surface.fill_rect(
                    x * self.scale,
                    y * self.scale,
                    self.scale,
                    self.scale,
                    colour,
                )?;
            }
        }
        surface.present()
    }
}

/// the canvas wants one point list per colour; group a physical cell grid
/// that way. two groups in practice, but nothing here insists on that
fn colour_groups(cells: &[Color], width: usize) -> Vec<(Color, Vec<(f64, f64)>)> {
    let mut groups: Vec<(Color, Vec<(f64, f64)>)> = Vec::new();
    for (idx, &colour) in cells.iter().enumerate() {
        let point = ((idx % width) as f64, -1.0 * ((idx / width) as f64));
        match groups.iter_mut().find(|(c, _)| *c == colour) {
            Some((_, points)) => points.push(point),
            None => groups.push((colour, vec![point])),
        }
    }
    groups
}

/// monochrome display in a terminal, rendered using TUI on crossterm.
/// `fill_rect` lands in an off-screen cell grid; `present` pushes the whole
/// grid through a TUI canvas, one canvas point per physical pixel
pub struct MonoTermSurface {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    width: usize,
    height: usize,
    cells: Vec<Color>,
}

impl MonoTermSurface {
    /// width and height in physical pixels, i.e. already scaled
    pub fn new(width: usize, height: usize) -> Result<MonoTermSurface, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(MonoTermSurface {
            terminal,
            width,
            height,
            cells: vec![Color::Black; width * height],
        })
    }
}

impl Surface for MonoTermSurface {
    fn fill_rect(
        &mut self,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        colour: Color,
    ) -> Result<(), io::Error> {
        // the renderer only hands out blocks that fit the surface it sized;
        // anything else is a shell bug, not a core fault
        assert!(
            x + w <= self.width && y + h <= self.height,
            "fill_rect outside the {}x{} surface",
            self.width,
            self.height
        );
        for row in y..y + h {
            for col in x..x + w {
                self.cells[col + row * self.width] = colour;
            }
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), io::Error> {
        let groups = colour_groups(&self.cells, self.width);
        let (width, height) = (self.width, self.height);
        self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + width as u16, 2 + height as u16);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds([0.0, (width - 1) as f64])
                .y_bounds([-1.0 * (height - 1) as f64, 0.0])
                .marker(Marker::Block)
                .paint(|ctx| {
                    for (colour, points) in &groups {
                        ctx.draw(&Points {
                            coords: points,
                            color: *colour,
                        });
                    }
                });
            f.render_widget(canvas, size.intersection(f.size()));
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines
pub struct DummySurface;

impl DummySurface {
    pub fn new() -> DummySurface {
        DummySurface {}
    }
}

impl Surface for DummySurface {
    #[allow(unused)]
    fn fill_rect(
        &mut self,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        colour: Color,
    ) -> Result<(), io::Error> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// remembers every rectangle it was asked to fill
    struct RecordingSurface {
        rects: Vec<(usize, usize, usize, usize, Color)>,
        presents: usize,
    }

    impl RecordingSurface {
        fn new() -> RecordingSurface {
            RecordingSurface {
                rects: Vec::new(),
                presents: 0,
            }
        }
    }

    impl Surface for RecordingSurface {
        fn fill_rect(
            &mut self,
            x: usize,
            y: usize,
            w: usize,
            h: usize,
            colour: Color,
        ) -> Result<(), io::Error> {
            self.rects.push((x, y, w, h, colour));
            Ok(())
        }

        fn present(&mut self) -> Result<(), io::Error> {
            self.presents += 1;
            Ok(())
        }
    }

    // FrameBuffer tests

    #[test]
    fn test_framebuffer_rejects_wrong_length() {
        let bytes = [0u8; 100];
        let err = FrameBuffer::new(&bytes, 64, 32).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_framebuffer_indexing() -> Result<(), io::Error> {
        // (3, 1) on a 64-wide display is byte 3 + 1*64 = 67
        let mut bytes = [0u8; 64 * 32];
        bytes[67] = 0xff;
        let frame = FrameBuffer::new(&bytes, 64, 32)?;
        assert!(frame.lit(3, 1));
        assert!(!frame.lit(2, 1));
        assert!(!frame.lit(3, 0));
        assert!(!frame.lit(4, 1));
        Ok(())
    }

    #[test]
    fn test_any_nonzero_byte_is_lit() -> Result<(), io::Error> {
        let bytes = [1u8, 0x80, 0xff, 0];
        let frame = FrameBuffer::new(&bytes, 4, 1)?;
        assert!(frame.lit(0, 0));
        assert!(frame.lit(1, 0));
        assert!(frame.lit(2, 0));
        assert!(!frame.lit(3, 0));
        Ok(())
    }

    // Renderer tests

    #[test]
    fn test_all_zero_paints_background() -> Result<(), io::Error> {
        let bytes = [0u8; 64 * 32];
        let frame = FrameBuffer::new(&bytes, 64, 32)?;
        let mut surface = RecordingSurface::new();
        Renderer::new(1, Color::White, Color::Black).paint(&frame, &mut surface)?;
        assert_eq!(surface.rects.len(), 64 * 32);
        assert!(surface.rects.iter().all(|r| r.4 == Color::Black));
        assert_eq!(surface.presents, 1);
        Ok(())
    }

    #[test]
    fn test_all_lit_paints_foreground() -> Result<(), io::Error> {
        let bytes = [0xffu8; 64 * 32];
        let frame = FrameBuffer::new(&bytes, 64, 32)?;
        let mut surface = RecordingSurface::new();
        Renderer::new(1, Color::White, Color::Black).paint(&frame, &mut surface)?;
        assert_eq!(surface.rects.len(), 64 * 32);
        assert!(surface.rects.iter().all(|r| r.4 == Color::White));
        Ok(())
    }

    #[test]
    fn test_blocks_are_scaled_and_placed() -> Result<(), io::Error> {
        let bytes = [0, 1, 0, 0];
        let frame = FrameBuffer::new(&bytes, 2, 2)?;
        let mut surface = RecordingSurface::new();
        Renderer::new(3, Color::White, Color::Black).paint(&frame, &mut surface)?;
        // row-major: (0,0) (1,0) (0,1) (1,1), each a 3x3 block at 3x its origin
        assert_eq!(
            surface.rects,
            vec![
                (0, 0, 3, 3, Color::Black),
                (3, 0, 3, 3, Color::White),
                (0, 3, 3, 3, Color::Black),
                (3, 3, 3, 3, Color::Black),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_repaint_covers_everything_again() -> Result<(), io::Error> {
        let bytes = [0u8; 16];
        let frame = FrameBuffer::new(&bytes, 4, 4)?;
        let mut surface = RecordingSurface::new();
        let renderer = Renderer::new(2, Color::White, Color::Black);
        renderer.paint(&frame, &mut surface)?;
        renderer.paint(&frame, &mut surface)?;
        assert_eq!(surface.rects.len(), 32);
        assert_eq!(surface.presents, 2);
        Ok(())
    }

    // colour grouping for the terminal canvas

    #[test]
    fn test_colour_groups_split_by_colour() {
        let cells = vec![Color::Black, Color::White, Color::Black, Color::White];
        let groups = colour_groups(&cells, 2);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, Color::Black);
        assert_eq!(groups[0].1, vec![(0.0, 0.0), (0.0, -1.0)]);
        assert_eq!(groups[1].0, Color::White);
        assert_eq!(groups[1].1, vec![(1.0, 0.0), (1.0, -1.0)]);
    }

    #[test]
    fn test_colour_groups_cover_every_cell() {
        let cells = vec![Color::Black; 64 * 32];
        let groups = colour_groups(&cells, 64);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].1.len(), 64 * 32);
    }
}
