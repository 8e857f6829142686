use crate::error::{Error, Result};
use crate::reader::DviReader;

/// DVI/XDV format version, fixed at pre-amble parse time.
///
/// Gates which opcodes (in particular the XDV extension range 251..=255)
/// are legal for the remainder of the file.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DviVersion {
    Standard = 2,
    PTex = 3,
    Xdv5 = 5,
    Xdv6 = 6,
    Xdv7 = 7,
}

impl DviVersion {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            2 => Ok(DviVersion::Standard),
            3 => Ok(DviVersion::PTex),
            5 => Ok(DviVersion::Xdv5),
            6 => Ok(DviVersion::Xdv6),
            7 => Ok(DviVersion::Xdv7),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }

    fn allows_xdv(self) -> bool {
        matches!(self, DviVersion::Xdv5 | DviVersion::Xdv6 | DviVersion::Xdv7)
    }

    /// Whether this version's extension range includes the `dir` opcode
    /// (pTeX's vertical-writing direction change, carried into XDV).
    fn allows_dir(self) -> bool {
        !matches!(self, DviVersion::Standard)
    }
}

/// Ten `\count0..\count9`-style page counters recorded at `bop`.
pub type PageCounters = [i32; 10];

/// Raw, opcode-level callbacks. Implemented only by the state machine
/// ([`crate::state::Machine`]); the decoder never interprets geometry
/// itself, it only decodes operand bytes and dispatches.
pub trait DviExec {
    fn set_char(&mut self, code: u32, advance: bool) -> Result<()>;
    fn put_rule(&mut self, height: i32, width: i32, advance: bool) -> Result<()>;
    fn nop(&mut self) {}
    fn bop(&mut self, counters: PageCounters, prev_bop: i32) -> Result<()>;
    fn eop(&mut self) -> Result<()>;
    fn push(&mut self) -> Result<()>;
    fn pop(&mut self) -> Result<()>;
    fn right(&mut self, b: i32) -> Result<()>;
    fn down(&mut self, b: i32) -> Result<()>;
    fn w(&mut self, b: Option<i32>) -> Result<()>;
    fn x(&mut self, b: Option<i32>) -> Result<()>;
    fn y(&mut self, b: Option<i32>) -> Result<()>;
    fn z(&mut self, b: Option<i32>) -> Result<()>;
    fn fnt_num(&mut self, font: u32) -> Result<()>;
    fn xxx(&mut self, body: Vec<u8>) -> Result<()>;
    fn fnt_def(&mut self, font_num: u32, checksum: u32, scale: u32, design: u32, area: String, name: String) -> Result<()>;
    fn pre(&mut self, version: DviVersion, num: u32, den: u32, mag: u32, comment: String) -> Result<()>;
    fn post(&mut self) -> Result<()>;
    /// `dx, dy` pairs for each glyph (XDV `xdv-text-and-glyphs`/glyph-array opcodes).
    fn xdv_glyphs(&mut self, text: Option<String>, glyphs: Vec<(i32, i32)>) -> Result<()>;
    /// pTeX/XDV `dir` opcode: switches the prevailing writing direction.
    /// `vertical` is `true` for any direction other than left-to-right
    /// horizontal, matching the original's `dir != WritingMode::LR` test.
    fn dir(&mut self, vertical: bool) -> Result<()> {
        let _ = vertical;
        Ok(())
    }
}

/// The length in bytes of an opcode's operand block, as determined purely
/// from the opcode byte (no lookahead into the operands themselves).
#[derive(Clone, Copy, Debug)]
enum OperandLen {
    None,
    Fixed(u8),
    /// `xxx`/special: `op - 238` bytes give the length of a following byte string.
    XxxLenPrefixed(u8),
    /// `fntdef`: index size is `op - 242`, the rest of the record is self-describing.
    FontDef(u8),
    /// pre-amble: self-describing (comment length is itself read as part of the operand).
    Pre,
    /// postamble / postpostamble: not decoded by the main pass (see postamble walk).
    Post,
}

/// Decodes exactly one DVI command per call and dispatches to a [`DviExec`].
pub struct Decoder {
    version: DviVersion,
}

impl Decoder {
    pub fn new(version: DviVersion) -> Self {
        Decoder { version }
    }

    pub fn version(&self) -> DviVersion {
        self.version
    }

    /// Reads and executes exactly one command, returning the opcode byte
    /// that was processed.
    pub fn execute_command(&mut self, reader: &mut DviReader, exec: &mut dyn DviExec) -> Result<u8> {
        let op = reader.read_u(1)? as u8;
        match op {
            0..=127 => exec.set_char(op as u32, true)?,
            128..=131 => {
                let len = op - 127;
                let code = reader.read_u(len)?;
                exec.set_char(code, true)?;
            }
            132 => {
                let h = reader.read_s(4)?;
                let w = reader.read_s(4)?;
                exec.put_rule(h, w, true)?;
            }
            133..=136 => {
                let len = op - 132;
                let code = reader.read_u(len)?;
                exec.set_char(code, false)?;
            }
            137 => {
                let h = reader.read_s(4)?;
                let w = reader.read_s(4)?;
                exec.put_rule(h, w, false)?;
            }
            138 => exec.nop(),
            139 => {
                let mut counters: PageCounters = [0; 10];
                for c in counters.iter_mut() {
                    *c = reader.read_s(4)?;
                }
                let prev = reader.read_s(4)?;
                exec.bop(counters, prev)?;
            }
            140 => exec.eop()?,
            141 => exec.push()?,
            142 => exec.pop()?,
            143..=146 => {
                let b = reader.read_s(op - 142)?;
                exec.right(b)?;
            }
            147 => exec.w(None)?,
            148..=151 => {
                let b = reader.read_s(op - 147)?;
                exec.w(Some(b))?;
            }
            152 => exec.x(None)?,
            153..=156 => {
                let b = reader.read_s(op - 152)?;
                exec.x(Some(b))?;
            }
            157..=160 => {
                let b = reader.read_s(op - 156)?;
                exec.down(b)?;
            }
            161 => exec.y(None)?,
            162..=165 => {
                let b = reader.read_s(op - 161)?;
                exec.y(Some(b))?;
            }
            166 => exec.z(None)?,
            167..=170 => {
                let b = reader.read_s(op - 166)?;
                exec.z(Some(b))?;
            }
            171..=234 => exec.fnt_num((op - 171) as u32)?,
            235..=238 => {
                let len = op - 234;
                let font = reader.read_u(len)?;
                exec.fnt_num(font)?;
            }
            239..=242 => {
                let len_bytes = op - 238;
                let n = reader.read_u(len_bytes)? as usize;
                let body = reader.read_bytes(n)?.to_vec();
                exec.xxx(body)?;
            }
            243..=246 => {
                let len_bytes = op - 242;
                let font_num = reader.read_u(len_bytes)?;
                let checksum = reader.read_u(4)?;
                let scale = reader.read_u(4)?;
                let design = reader.read_u(4)?;
                let area_len = reader.read_u(1)? as usize;
                let name_len = reader.read_u(1)? as usize;
                let area = reader.read_string(area_len)?;
                let name = reader.read_string(name_len)?;
                exec.fnt_def(font_num, checksum, scale, design, area, name)?;
            }
            247 => {
                let version_byte = reader.read_u(1)? as u8;
                let version = DviVersion::from_byte(version_byte)?;
                self.version = version;
                let num = reader.read_u(4)?;
                let den = reader.read_u(4)?;
                let mag = reader.read_u(4)?;
                let comment_len = reader.read_u(1)? as usize;
                let comment = reader.read_string(comment_len)?;
                exec.pre(version, num, den, mag, comment)?;
            }
            248 => exec.post()?,
            249 => {} // postpost, handled by the postamble walk, not the main pass
            250..=254 => {
                if !self.version.allows_xdv() {
                    return Err(Error::UnsupportedOpcode(op));
                }
                self.execute_xdv(op, reader, exec)?;
            }
            255 => {
                if !self.version.allows_dir() {
                    return Err(Error::UnsupportedOpcode(op));
                }
                let d = reader.read_u(1)? as u8;
                exec.dir(d != 0)?;
            }
        }
        Ok(op)
    }

    fn execute_xdv(&mut self, op: u8, reader: &mut DviReader, exec: &mut dyn DviExec) -> Result<()> {
        match op {
            251 => {
                // xdv-fnt-def: same payload shape as fntdef, 4-byte font number.
                let font_num = reader.read_u(4)?;
                let checksum = reader.read_u(4)?;
                let scale = reader.read_u(4)?;
                let design = reader.read_u(4)?;
                let area_len = reader.read_u(1)? as usize;
                let name_len = reader.read_u(1)? as usize;
                let area = reader.read_string(area_len)?;
                let name = reader.read_string(name_len)?;
                exec.fnt_def(font_num, checksum, scale, design, area, name)
            }
            252 => {
                // xdv-glyph-array: width(4, ignored by geometry), count(2), then
                // count*(dx,dy) 4-byte pairs, count glyph ids (2 bytes each).
                let _width = reader.read_s(4)?;
                let count = reader.read_u(2)? as usize;
                let mut glyphs = Vec::with_capacity(count);
                for _ in 0..count {
                    let dx = reader.read_s(4)?;
                    let dy = reader.read_s(4)?;
                    glyphs.push((dx, dy));
                }
                for _ in 0..count {
                    let _glyph_id = reader.read_u(2)?;
                }
                exec.xdv_glyphs(None, glyphs)
            }
            253 if self.version == DviVersion::Xdv7 => {
                // xdv-text-and-glyphs: utf16 text length+body, then as glyph-array.
                let text_len = reader.read_u(2)? as usize;
                let mut units = Vec::with_capacity(text_len);
                for _ in 0..text_len {
                    units.push(reader.read_u(2)? as u16);
                }
                let text = String::from_utf16_lossy(&units);
                let _width = reader.read_s(4)?;
                let count = reader.read_u(2)? as usize;
                let mut glyphs = Vec::with_capacity(count);
                for _ in 0..count {
                    let dx = reader.read_s(4)?;
                    let dy = reader.read_s(4)?;
                    glyphs.push((dx, dy));
                }
                for _ in 0..count {
                    let _glyph_id = reader.read_u(2)?;
                }
                exec.xdv_glyphs(Some(text), glyphs)
            }
            253 | 254 if self.version == DviVersion::Xdv5 => {
                // xdv-glyph-string / xdv-pic: neither influences cursor geometry
                // directly; the payload length is self-describing (a 4-byte count).
                let n = reader.read_u(4)? as usize;
                reader.read_bytes(n)?;
                Ok(())
            }
            _ => Err(Error::UnsupportedOpcode(op)),
        }
    }
}

/// Dense 256-entry classification of each opcode's operand shape, kept
/// as data mainly so tests and documentation can enumerate the table
/// without re-deriving it from the `match` above.
pub fn operand_len_kind(op: u8) -> &'static str {
    match op {
        0..=131 => "set_char",
        132 | 137 => "rule",
        133..=136 => "set_char",
        138 => "nop",
        139 => "bop",
        140 => "eop",
        141 => "push",
        142 => "pop",
        143..=170 => "move",
        171..=238 => "fnt_num",
        239..=242 => "xxx",
        243..=246 => "fnt_def",
        247 => "pre",
        248 | 249 => "post",
        250..=254 => "xdv",
        255 => "dir",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sink {
        calls: Vec<String>,
    }

    impl DviExec for Sink {
        fn set_char(&mut self, code: u32, advance: bool) -> Result<()> {
            self.calls.push(format!("set_char({code},{advance})"));
            Ok(())
        }
        fn put_rule(&mut self, h: i32, w: i32, advance: bool) -> Result<()> {
            self.calls.push(format!("rule({h},{w},{advance})"));
            Ok(())
        }
        fn bop(&mut self, _c: PageCounters, _p: i32) -> Result<()> {
            self.calls.push("bop".into());
            Ok(())
        }
        fn eop(&mut self) -> Result<()> {
            self.calls.push("eop".into());
            Ok(())
        }
        fn push(&mut self) -> Result<()> {
            self.calls.push("push".into());
            Ok(())
        }
        fn pop(&mut self) -> Result<()> {
            self.calls.push("pop".into());
            Ok(())
        }
        fn right(&mut self, b: i32) -> Result<()> {
            self.calls.push(format!("right({b})"));
            Ok(())
        }
        fn down(&mut self, b: i32) -> Result<()> {
            self.calls.push(format!("down({b})"));
            Ok(())
        }
        fn w(&mut self, b: Option<i32>) -> Result<()> {
            self.calls.push(format!("w({b:?})"));
            Ok(())
        }
        fn x(&mut self, b: Option<i32>) -> Result<()> {
            self.calls.push(format!("x({b:?})"));
            Ok(())
        }
        fn y(&mut self, b: Option<i32>) -> Result<()> {
            self.calls.push(format!("y({b:?})"));
            Ok(())
        }
        fn z(&mut self, b: Option<i32>) -> Result<()> {
            self.calls.push(format!("z({b:?})"));
            Ok(())
        }
        fn fnt_num(&mut self, f: u32) -> Result<()> {
            self.calls.push(format!("fnt_num({f})"));
            Ok(())
        }
        fn xxx(&mut self, body: Vec<u8>) -> Result<()> {
            self.calls.push(format!("xxx({})", body.len()));
            Ok(())
        }
        fn fnt_def(&mut self, n: u32, _c: u32, _s: u32, _d: u32, _a: String, _nm: String) -> Result<()> {
            self.calls.push(format!("fnt_def({n})"));
            Ok(())
        }
        fn pre(&mut self, v: DviVersion, _n: u32, _d: u32, _m: u32, _c: String) -> Result<()> {
            self.calls.push(format!("pre({:?})", v));
            Ok(())
        }
        fn post(&mut self) -> Result<()> {
            self.calls.push("post".into());
            Ok(())
        }
        fn xdv_glyphs(&mut self, text: Option<String>, glyphs: Vec<(i32, i32)>) -> Result<()> {
            self.calls.push(format!("xdv_glyphs({text:?},{})", glyphs.len()));
            Ok(())
        }
        fn dir(&mut self, vertical: bool) -> Result<()> {
            self.calls.push(format!("dir({vertical})"));
            Ok(())
        }
    }

    #[test]
    fn decodes_xxx_then_set_rule() {
        // xxx "hello" (op 239, len 5), then set_rule 0x3E80 x 0x9C40, then eop.
        let mut data = vec![239u8, 5, b'h', b'e', b'l', b'l', b'o'];
        data.push(132);
        data.extend_from_slice(&0x3E80i32.to_be_bytes());
        data.extend_from_slice(&0x9C40i32.to_be_bytes());
        data.push(140);
        let mut reader = DviReader::new(data);
        let mut decoder = Decoder::new(DviVersion::Standard);
        let mut sink = Sink { calls: vec![] };
        decoder.execute_command(&mut reader, &mut sink).unwrap();
        decoder.execute_command(&mut reader, &mut sink).unwrap();
        decoder.execute_command(&mut reader, &mut sink).unwrap();
        assert_eq!(sink.calls, vec!["xxx(5)", "rule(16000,40000,true)", "eop"]);
    }

    #[test]
    fn rejects_xdv_opcode_on_standard_version() {
        let mut reader = DviReader::new(vec![252]);
        let mut decoder = Decoder::new(DviVersion::Standard);
        let mut sink = Sink { calls: vec![] };
        let err = decoder.execute_command(&mut reader, &mut sink).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOpcode(252)));
    }

    #[test]
    fn dir_opcode_toggles_vertical_on_ptex_version() {
        let mut data = vec![255u8, 1]; // dir, vertical
        data.push(255);
        data.push(0); // dir, back to horizontal
        let mut reader = DviReader::new(data);
        let mut decoder = Decoder::new(DviVersion::PTex);
        let mut sink = Sink { calls: vec![] };
        decoder.execute_command(&mut reader, &mut sink).unwrap();
        decoder.execute_command(&mut reader, &mut sink).unwrap();
        assert_eq!(sink.calls, vec!["dir(true)", "dir(false)"]);
    }

    #[test]
    fn rejects_dir_opcode_on_standard_version() {
        let mut reader = DviReader::new(vec![255, 1]);
        let mut decoder = Decoder::new(DviVersion::Standard);
        let mut sink = Sink { calls: vec![] };
        let err = decoder.execute_command(&mut reader, &mut sink).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOpcode(255)));
    }

    #[test]
    fn push_right_pop_sequence_decodes() {
        let mut data = vec![139u8];
        data.extend_from_slice(&[0; 40]); // 10 counters
        data.extend_from_slice(&0i32.to_be_bytes()); // prev bop
        data.push(141); // push
        data.push(141); // push
        data.push(146); // right4
        data.extend_from_slice(&100_000i32.to_be_bytes());
        data.push(142); // pop
        data.push(142); // pop
        data.push(140); // eop
        let mut reader = DviReader::new(data);
        let mut decoder = Decoder::new(DviVersion::Standard);
        let mut sink = Sink { calls: vec![] };
        loop {
            let op = decoder.execute_command(&mut reader, &mut sink).unwrap();
            if op == 140 {
                break;
            }
        }
        assert_eq!(
            sink.calls,
            vec!["bop", "push", "push", "right(100000)", "pop", "pop", "eop"]
        );
    }
}
