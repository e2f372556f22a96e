//! Tab-delimited serial line tokenizer
//!
//! Every line from the firmware is a tag followed by tab-separated fields:
//!
//! ```text
//! o\t<x>\t<y>\t<theta>\t<theta_gyro>\t<vx>\t<omega>\t<ping0>\t<ir0>...\t<ping5>\t<ir5>
//! i\t<message>
//! s\t<message>
//! ```

/// Field separator on the wire
pub const FIELD_DELIMITER: char = '\t';

/// Leading tag of a serial line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    /// `o` - odometry + sensor report (also the motor power-on trigger)
    Odometry,
    /// `i` - initialization request for drive geometry
    Init,
    /// `s` - free-form status text
    Status,
    /// Anything else
    Unknown,
}

impl From<&str> for LineTag {
    fn from(tag: &str) -> Self {
        match tag {
            "o" => LineTag::Odometry,
            "i" => LineTag::Init,
            "s" => LineTag::Status,
            _ => LineTag::Unknown,
        }
    }
}

/// One received line split into fields
///
/// Borrowed from the raw line; lives only for the duration of a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialLine<'a> {
    raw: &'a str,
    fields: Vec<&'a str>,
}

impl<'a> SerialLine<'a> {
    /// Split a raw line on tabs
    ///
    /// Trailing `\r`/`\n` are stripped first. Returns `None` for empty lines,
    /// which are ignored without dispatch.
    pub fn parse(line: &'a str) -> Option<Self> {
        let raw = line.trim_end_matches(['\r', '\n']);
        if raw.is_empty() {
            return None;
        }
        Some(Self {
            raw,
            fields: raw.split(FIELD_DELIMITER).collect(),
        })
    }

    pub fn tag(&self) -> LineTag {
        LineTag::from(self.fields[0])
    }

    /// Field at `index` (0 is the tag)
    pub fn field(&self, index: usize) -> Option<&'a str> {
        self.fields.get(index).copied()
    }

    /// Number of fields including the tag; never zero
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Raw text after the tag and its delimiter, untouched
    pub fn payload(&self) -> &'a str {
        match self.raw.split_once(FIELD_DELIMITER) {
            Some((_, rest)) => rest,
            None => "",
        }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_lines_are_ignored() {
        assert!(SerialLine::parse("").is_none());
        assert!(SerialLine::parse("\r\n").is_none());
        assert!(SerialLine::parse("\r").is_none());
    }

    #[test]
    fn test_tag_dispatch() {
        let tags: Vec<LineTag> = ["o\t1", "i\thello", "s\tstatus", "x\t1", "oo", "\t1"]
            .iter()
            .filter_map(|l| SerialLine::parse(l))
            .map(|l| l.tag())
            .collect();
        assert_eq!(
            tags,
            vec![
                LineTag::Odometry,
                LineTag::Init,
                LineTag::Status,
                LineTag::Unknown,
                LineTag::Unknown,
                LineTag::Unknown,
            ]
        );
    }

    #[test]
    fn test_fields_and_trailing_carriage_return() {
        let line = SerialLine::parse("o\t1.5\t-2.0\t0.1\r\n").unwrap();
        assert_eq!(line.field_count(), 4);
        assert_eq!(line.field(0), Some("o"));
        assert_eq!(line.field(3), Some("0.1"));
        assert_eq!(line.field(4), None);
        assert_eq!(line.raw(), "o\t1.5\t-2.0\t0.1");
    }

    #[test]
    fn test_payload_is_verbatim() {
        let line = SerialLine::parse("s\tBattery low\tcheck\t 12.1V ").unwrap();
        assert_eq!(line.payload(), "Battery low\tcheck\t 12.1V ");

        let bare = SerialLine::parse("s").unwrap();
        assert_eq!(bare.payload(), "");
        assert_eq!(bare.field_count(), 1);
    }
}
