use crate::decoder::{DviExec, DviVersion, PageCounters};
use crate::error::{Error, Result};
use crate::font::{FontId, FontManager};
use crate::handler::DviHandler;

/// The `(h, v, w, x, y, z, direction)` register file, snapshotted by
/// `push`/`pop`.
#[derive(Clone, Copy, Debug, Default)]
struct Registers {
    h: i64,
    v: i64,
    w: i64,
    x: i64,
    y: i64,
    z: i64,
    vertical: bool,
}

/// Maximum stack depth observed so far; checked against the postamble's
/// declared hint by callers that care (the core itself only needs to
/// detect underflow, §8's stack-depth invariant is a property the driver
/// verifies against the postamble).
pub struct Machine<'a> {
    regs: Registers,
    stack: Vec<Registers>,
    current_font: Option<FontId>,
    version: DviVersion,
    page_no: usize,
    /// Global scale pair from the pre-amble, `(1,1,1000)` (a 1:1 mapping)
    /// until `pre` has actually been processed.
    scale: (u32, u32, u32),
    cancel: Option<std::sync::Arc<std::sync::atomic::AtomicBool>>,
    fonts: &'a mut dyn FontManager,
    handler: &'a mut dyn DviHandler,
}

impl<'a> Machine<'a> {
    pub fn new(version: DviVersion, fonts: &'a mut dyn FontManager, handler: &'a mut dyn DviHandler) -> Self {
        Machine {
            regs: Registers::default(),
            stack: Vec::new(),
            current_font: None,
            version,
            page_no: 0,
            scale: (1, 1, 1000),
            cancel: None,
            fonts,
            handler,
        }
    }

    pub fn with_cancellation(mut self, flag: std::sync::Arc<std::sync::atomic::AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    fn check_cancelled(&self) -> Result<()> {
        if let Some(flag) = &self.cancel {
            if flag.load(std::sync::atomic::Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }
        }
        Ok(())
    }
}

impl<'a> DviExec for Machine<'a> {
    fn set_char(&mut self, code: u32, advance: bool) -> Result<()> {
        self.check_cancelled()?;
        let width = self
            .current_font
            .and_then(|id| self.fonts.font_mut(id))
            .map(|f| {
                f.mark_used(code);
                f.glyph_width(code)
            })
            .unwrap_or(0);
        self.handler
            .set_char(self.regs.h, self.regs.v, code, self.regs.vertical, self.current_unique_font(), advance)?;
        if advance {
            if self.regs.vertical {
                self.regs.v += width;
            } else {
                self.regs.h += width;
            }
        }
        Ok(())
    }

    fn put_rule(&mut self, height: i32, width: i32, advance: bool) -> Result<()> {
        self.check_cancelled()?;
        if height > 0 && width > 0 {
            self.handler.set_rule(self.regs.h, self.regs.v, height as i64, width as i64, advance);
        }
        if advance {
            self.regs.h += width as i64;
        }
        Ok(())
    }

    fn nop(&mut self) {}

    fn bop(&mut self, counters: PageCounters, _prev_bop: i32) -> Result<()> {
        self.regs = Registers::default();
        self.stack.clear();
        self.page_no += 1;
        self.handler.begin_page(self.page_no, counters);
        Ok(())
    }

    fn eop(&mut self) -> Result<()> {
        if !self.stack.is_empty() {
            return Err(Error::StackUnderflow);
        }
        self.handler.end_page();
        Ok(())
    }

    fn push(&mut self) -> Result<()> {
        self.stack.push(self.regs);
        Ok(())
    }

    fn pop(&mut self) -> Result<()> {
        self.regs = self.stack.pop().ok_or(Error::StackUnderflow)?;
        self.handler.move_to(self.regs.h, self.regs.v, true);
        Ok(())
    }

    fn right(&mut self, b: i32) -> Result<()> {
        self.regs.h += b as i64;
        self.handler.move_to(self.regs.h, self.regs.v, false);
        Ok(())
    }

    fn down(&mut self, b: i32) -> Result<()> {
        self.regs.v += b as i64;
        self.handler.move_to(self.regs.h, self.regs.v, false);
        Ok(())
    }

    fn w(&mut self, b: Option<i32>) -> Result<()> {
        if let Some(b) = b {
            self.regs.w = b as i64;
        }
        self.regs.h += self.regs.w;
        self.handler.move_to(self.regs.h, self.regs.v, false);
        Ok(())
    }

    fn x(&mut self, b: Option<i32>) -> Result<()> {
        if let Some(b) = b {
            self.regs.x = b as i64;
        }
        self.regs.h += self.regs.x;
        self.handler.move_to(self.regs.h, self.regs.v, false);
        Ok(())
    }

    fn y(&mut self, b: Option<i32>) -> Result<()> {
        if let Some(b) = b {
            self.regs.y = b as i64;
        }
        self.regs.v += self.regs.y;
        self.handler.move_to(self.regs.h, self.regs.v, false);
        Ok(())
    }

    fn z(&mut self, b: Option<i32>) -> Result<()> {
        if let Some(b) = b {
            self.regs.z = b as i64;
        }
        self.regs.v += self.regs.z;
        self.handler.move_to(self.regs.h, self.regs.v, false);
        Ok(())
    }

    fn fnt_num(&mut self, font: u32) -> Result<()> {
        self.current_font = self.fonts.resolve_local(font);
        if self.current_font.is_none() {
            log::warn!("font number {} was never defined via fntdef", font);
        }
        self.handler.set_font(self.current_unique_font());
        Ok(())
    }

    fn xxx(&mut self, body: Vec<u8>) -> Result<()> {
        match String::from_utf8(body) {
            Ok(s) => self.handler.special(&s),
            Err(_) => log::warn!("special body is not valid UTF-8, ignoring"),
        }
        Ok(())
    }

    fn fnt_def(&mut self, font_num: u32, checksum: u32, scale: u32, design: u32, area: String, name: String) -> Result<()> {
        let scaled = self.dvi_to_pt(scale as i64);
        let designed = self.dvi_to_pt(design as i64);
        if self.fonts.define(font_num, &name, &area, checksum, scaled, designed).is_none() {
            log::warn!("could not resolve font '{}'", name);
        }
        Ok(())
    }

    fn pre(&mut self, version: DviVersion, num: u32, den: u32, mag: u32, comment: String) -> Result<()> {
        self.version = version;
        self.scale = (num, den, mag);
        self.handler.preamble(version, num, den, mag, &comment);
        Ok(())
    }

    fn post(&mut self) -> Result<()> {
        Ok(())
    }

    fn xdv_glyphs(&mut self, text: Option<String>, glyphs: Vec<(i32, i32)>) -> Result<()> {
        let base = self.regs;
        if let Some(id) = self.current_font {
            if let Some(f) = self.fonts.font_mut(id) {
                f.mark_used(0);
            }
        }
        for (dx, dy) in glyphs {
            let h = base.h + dx as i64;
            let v = base.v + dy as i64;
            // Glyph ids aren't surfaced through this contract (out of
            // scope: OpenType shaping), so every glyph here is reported
            // under character code 0; the cursor is left unchanged after
            // the opcode, per spec.
            self.handler.set_char(h, v, 0, base.vertical, self.current_unique_font(), false)?;
        }
        let _ = text;
        Ok(())
    }

    fn dir(&mut self, vertical: bool) -> Result<()> {
        self.check_cancelled()?;
        self.regs.vertical = vertical;
        self.handler.set_writing_mode(vertical);
        Ok(())
    }
}

impl<'a> Machine<'a> {
    /// Converts a raw DVI-unit quantity into big points using the
    /// pre-amble's `(num, den, mag)` scale triple, defaulting to a 1:1
    /// mapping if `pre` has not yet been processed.
    fn dvi_to_pt(&self, raw: i64) -> f64 {
        let (num, den, mag) = self.scale;
        crate::units::to_big_points(raw, num, den, mag)
    }

    /// The canonical id scaled copies of the current font share, i.e.
    /// what [`DviHandler`] implementors key glyph/style output by — not
    /// the scaled instance's own id, which is only meaningful to the
    /// font manager's internal bookkeeping (`mark_used`/`glyph_width`).
    fn current_unique_font(&self) -> Option<FontId> {
        self.current_font.and_then(|id| self.fonts.font(id)).map(|f| f.unique_font())
    }
}
