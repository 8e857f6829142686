use crate::decoder::DviVersion;
use crate::error::{Error, Result};
use crate::reader::DviReader;

/// Everything the postamble records: page count, maximum page size hint,
/// the declared stack-depth bound, and the `bop` offsets in forward
/// (page 1 first) order.
pub struct Postamble {
    pub number_of_pages: u32,
    pub max_page_width: i32,
    pub max_page_height: i32,
    pub max_stack_depth: u16,
    /// Forward-ordered (page 1 .. N) absolute byte offsets of each `bop`.
    pub bop_offsets: Vec<usize>,
}

/// Opens the trailing run of `223` padding bytes, scans backward to the
/// postamble's `post` opcode, reads it, then walks the `bop` linked list
/// backward to produce a forward-ordered page offset list.
pub fn walk(reader: &mut DviReader) -> Result<Postamble> {
    reader.seek_end()?;
    let mut pos = reader.len();
    loop {
        if pos == 0 {
            return Err(Error::UnexpectedEof);
        }
        pos -= 1;
        reader.seek(pos)?;
        let byte = reader.read_bytes(1)?[0];
        if byte != 223 {
            break;
        }
    }
    // `pos` now indexes the last non-padding byte, which must be the
    // format-version byte that follows `postpost` (opcode 249). The
    // `postpost` record is exactly 5 bytes: opcode, then the 4-byte
    // postamble pointer, so it starts at `pos - 5`.
    if pos < 5 {
        return Err(Error::UnexpectedEof);
    }
    let postpost_pos = pos - 5;
    reader.seek(postpost_pos)?;
    let postpost_op = reader.read_bytes(1)?[0];
    if postpost_op != 249 {
        return Err(Error::UnexpectedEof);
    }
    let postamble_ptr = reader.read_u(4)? as usize;

    reader.seek(postamble_ptr)?;
    let post_op = reader.read_bytes(1)?[0];
    if post_op != 248 {
        return Err(Error::UnexpectedEof);
    }
    let last_bop = reader.read_s(4)?;
    let _num = reader.read_u(4)?;
    let _den = reader.read_u(4)?;
    let _mag = reader.read_u(4)?;
    let max_page_height = reader.read_s(4)?;
    let max_page_width = reader.read_s(4)?;
    let max_stack_depth = reader.read_u(2)? as u16;
    let number_of_pages = reader.read_u(2)?;

    let mut offsets = Vec::with_capacity(number_of_pages as usize);
    let mut cur = last_bop;
    while cur >= 0 {
        offsets.push(cur as usize);
        reader.seek(cur as usize)?;
        let op = reader.read_bytes(1)?[0];
        if op != 139 {
            return Err(Error::UnexpectedEof);
        }
        reader.read_bytes(40)?; // ten 4-byte counters
        cur = reader.read_s(4)?;
    }
    offsets.reverse();

    Ok(Postamble {
        number_of_pages,
        max_page_width,
        max_page_height,
        max_stack_depth,
        bop_offsets: offsets,
    })
}

/// Reads the pre-amble (opcode 247) at the very start of the stream.
pub struct Preamble {
    pub version: DviVersion,
    pub num: u32,
    pub den: u32,
    pub mag: u32,
    pub comment: String,
}

pub fn read_preamble(reader: &mut DviReader) -> Result<Preamble> {
    reader.seek(0)?;
    let op = reader.read_bytes(1)?[0];
    if op != 247 {
        return Err(Error::UnexpectedEof);
    }
    let version = DviVersion::from_byte(reader.read_bytes(1)?[0])?;
    let num = reader.read_u(4)?;
    let den = reader.read_u(4)?;
    let mag = reader.read_u(4)?;
    let comment_len = reader.read_u(1)? as usize;
    let comment = reader.read_string(comment_len)?;
    Ok(Preamble { version, num, den, mag, comment })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_minimal_dvi() -> Vec<u8> {
        let mut data = Vec::new();
        // pre
        data.push(247);
        data.push(2); // version
        data.extend_from_slice(&25400000u32.to_be_bytes());
        data.extend_from_slice(&473628672u32.to_be_bytes());
        data.extend_from_slice(&1000u32.to_be_bytes());
        data.push(0); // comment len

        let bop_offset = data.len();
        data.push(139);
        data.extend_from_slice(&[0u8; 40]);
        data.extend_from_slice(&(-1i32).to_be_bytes()); // prev bop = none
        data.push(140); // eop

        let post_offset = data.len();
        data.push(248);
        data.extend_from_slice(&(bop_offset as i32).to_be_bytes());
        data.extend_from_slice(&25400000u32.to_be_bytes());
        data.extend_from_slice(&473628672u32.to_be_bytes());
        data.extend_from_slice(&1000u32.to_be_bytes());
        data.extend_from_slice(&0i32.to_be_bytes()); // max height
        data.extend_from_slice(&0i32.to_be_bytes()); // max width
        data.extend_from_slice(&1u16.to_be_bytes()); // stack depth
        data.extend_from_slice(&1u16.to_be_bytes()); // number of pages

        data.push(249); // postpost
        data.extend_from_slice(&(post_offset as i32).to_be_bytes());
        data.push(2); // version byte repeated
        data.extend(std::iter::repeat(223u8).take(4));
        data
    }

    #[test]
    fn walks_single_page_postamble() {
        let data = build_minimal_dvi();
        let mut reader = DviReader::new(data);
        let post = walk(&mut reader).unwrap();
        assert_eq!(post.number_of_pages, 1);
        assert_eq!(post.bop_offsets.len(), 1);
        assert_eq!(post.bop_offsets[0], 15); // right after the 15-byte pre-amble
    }

    #[test]
    fn reads_preamble_version() {
        let data = build_minimal_dvi();
        let mut reader = DviReader::new(data);
        let pre = read_preamble(&mut reader).unwrap();
        assert_eq!(pre.version, DviVersion::Standard);
    }
}
