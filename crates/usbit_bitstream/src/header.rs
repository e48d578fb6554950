//! The bitstream header: a hybrid length-value / tag-length-value preamble
//! carrying the design name, target part, date/time, and header options.

use crate::error::BitstreamError;
use std::collections::BTreeMap;

const MAGIC_FIELD: &[u8] = &[0x0f, 0xf0, 0x0f, 0xf0, 0x0f, 0xf0, 0x0f, 0xf0, 0x00];
const DESIGN_NAME_TAG: &[u8] = b"a";
const PART_TAG: u8 = b'b';
const DATE_TAG: u8 = b'c';
const TIME_TAG: u8 = b'd';
const BODY_TAG: u8 = b'e';

/// Parsed bitstream header metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// The design name, the first `;`-separated token of field 3.
    pub design_name: String,
    /// `KEY=VALUE` options carried after the design name, keys normalized
    /// to uppercase (`COMPRESS`, `ENCRYPT`, `PARTIAL`, `UserID`, `Version`,
    /// …).
    pub options: BTreeMap<String, String>,
    /// Target FPGA part string.
    pub part: String,
    /// Build date string, as written by the tool that generated this
    /// bitstream.
    pub date: String,
    /// Build time string.
    pub time: String,
    /// Absolute byte offset at which the packet body begins.
    pub body_offset: usize,
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    fn malformed(&self, detail: impl Into<String>) -> BitstreamError {
        BitstreamError::MalformedHeader {
            offset: self.pos,
            detail: detail.into(),
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], BitstreamError> {
        if self.pos + n > self.buf.len() {
            return Err(self.malformed(format!("need {n} more bytes, only {} remain", self.buf.len() - self.pos)));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u16_len(&mut self) -> Result<usize, BitstreamError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]) as usize)
    }

    fn u32_len(&mut self) -> Result<usize, BitstreamError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize)
    }

    /// Reads a 2-byte length followed by that many bytes, stripping a
    /// single trailing NUL if present.
    fn lv_string_field(&mut self) -> Result<String, BitstreamError> {
        let len = self.u16_len()?;
        let bytes = self.take(len)?;
        let bytes = bytes.strip_suffix(&[0u8]).unwrap_or(bytes);
        String::from_utf8(bytes.to_vec())
            .map_err(|_| self.malformed("header field was not valid UTF-8"))
    }

    fn expect_tag(&mut self, tag: u8) -> Result<(), BitstreamError> {
        let byte = self.take(1)?[0];
        if byte != tag {
            return Err(self.malformed(format!(
                "expected tag {:?}, found {:?}",
                tag as char, byte as char
            )));
        }
        Ok(())
    }
}

fn split_design_name(field3: &str) -> (String, BTreeMap<String, String>) {
    let mut parts = field3.split(';');
    let design_name = parts.next().unwrap_or_default().to_string();
    let mut options = BTreeMap::new();
    for part in parts {
        if part.is_empty() {
            continue;
        }
        if let Some((key, value)) = part.split_once('=') {
            options.insert(key.to_ascii_uppercase(), value.to_string());
        }
    }
    (design_name, options)
}

impl Header {
    /// Parses a header from the start of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Header, BitstreamError> {
        let mut cur = Cursor::new(buf);

        let magic_len = cur.u16_len()?;
        let magic = cur.take(magic_len)?;
        if magic != MAGIC_FIELD {
            return Err(cur.malformed("header magic field did not match the expected preamble"));
        }

        let tag_a_len = cur.u16_len()?;
        let tag_a = cur.take(tag_a_len)?;
        if tag_a != DESIGN_NAME_TAG {
            return Err(cur.malformed("expected design-name tag field 'a'"));
        }

        let field3 = cur.lv_string_field()?;
        let (design_name, options) = split_design_name(&field3);

        cur.expect_tag(PART_TAG)?;
        let part = cur.lv_string_field()?;

        cur.expect_tag(DATE_TAG)?;
        let date = cur.lv_string_field()?;

        cur.expect_tag(TIME_TAG)?;
        let time = cur.lv_string_field()?;

        cur.expect_tag(BODY_TAG)?;
        let _body_len = cur.u32_len()?;
        let body_offset = cur.pos;

        Ok(Header {
            design_name,
            options,
            part,
            date,
            time,
            body_offset,
        })
    }

    /// Looks up an option by name, case-insensitively.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(&name.to_ascii_uppercase()).map(String::as_str)
    }

    fn flag(&self, name: &str, default: bool) -> bool {
        match self.option(name) {
            Some(v) => matches!(v.to_ascii_uppercase().as_str(), "YES" | "TRUE"),
            None => default,
        }
    }

    /// `true` iff the `ENCRYPT` option is `YES`/`TRUE`. Defaults to `false`.
    pub fn is_encrypted(&self) -> bool {
        self.flag("ENCRYPT", false)
    }

    /// `true` iff the `COMPRESS` option is `YES`/`TRUE`. Defaults to `false`.
    pub fn is_compressed(&self) -> bool {
        self.flag("COMPRESS", false)
    }

    /// `true` iff the `PARTIAL` option is `YES`/`TRUE`. Defaults to `false`.
    pub fn is_partial(&self) -> bool {
        self.flag("PARTIAL", false)
    }

    /// The `UserID` option, if present.
    pub fn user_id(&self) -> Option<&str> {
        self.option("UserID")
    }

    /// The `Version` option, if present.
    pub fn version(&self) -> Option<&str> {
        self.option("Version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_header_bytes(field3: &str, part: &str, date: &str, time: &str, body: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAGIC_FIELD.len() as u16).to_be_bytes());
        buf.extend_from_slice(MAGIC_FIELD);
        buf.extend_from_slice(&(DESIGN_NAME_TAG.len() as u16).to_be_bytes());
        buf.extend_from_slice(DESIGN_NAME_TAG);

        let mut f3 = field3.as_bytes().to_vec();
        f3.push(0);
        buf.extend_from_slice(&(f3.len() as u16).to_be_bytes());
        buf.extend_from_slice(&f3);

        for (tag, value) in [(PART_TAG, part), (DATE_TAG, date), (TIME_TAG, time)] {
            buf.push(tag);
            let mut v = value.as_bytes().to_vec();
            v.push(0);
            buf.extend_from_slice(&(v.len() as u16).to_be_bytes());
            buf.extend_from_slice(&v);
        }

        buf.push(BODY_TAG);
        buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
        buf.extend_from_slice(body);
        buf
    }

    #[test]
    fn parses_typical_header() {
        let bytes = build_header_bytes(
            "top;COMPRESS=TRUE;ENCRYPT=NO;UserID=0XFFFFFFFF;Version=2020.1",
            "xcku025-ffva1156-1-c",
            "2020/01/01",
            "12:00:00",
            &[0xAA, 0x99, 0x55, 0x66],
        );
        let header = Header::parse(&bytes).unwrap();
        assert_eq!(header.design_name, "top");
        assert_eq!(header.part, "xcku025-ffva1156-1-c");
        assert_eq!(header.date, "2020/01/01");
        assert_eq!(header.time, "12:00:00");
        assert!(header.is_compressed());
        assert!(!header.is_encrypted());
        assert_eq!(header.user_id(), Some("0XFFFFFFFF"));
        assert_eq!(&bytes[header.body_offset..], &[0xAA, 0x99, 0x55, 0x66]);
    }

    #[test]
    fn defaults_are_false_when_options_absent() {
        let bytes = build_header_bytes("top", "part", "date", "time", &[]);
        let header = Header::parse(&bytes).unwrap();
        assert!(!header.is_compressed());
        assert!(!header.is_encrypted());
        assert!(!header.is_partial());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = build_header_bytes("top", "part", "date", "time", &[]);
        bytes[3] = 0x00;
        let err = Header::parse(&bytes).unwrap_err();
        assert!(matches!(err, BitstreamError::MalformedHeader { .. }));
    }

    #[test]
    fn rejects_wrong_tag_order() {
        let mut bytes = build_header_bytes("top", "part", "date", "time", &[]);
        // Corrupt the 'b' tag that should precede the part field.
        let tag_b_pos = bytes
            .windows(1)
            .position(|w| w == [PART_TAG])
            .expect("tag present");
        bytes[tag_b_pos] = b'z';
        let err = Header::parse(&bytes).unwrap_err();
        assert!(matches!(err, BitstreamError::MalformedHeader { .. }));
    }
}
