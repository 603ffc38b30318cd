//! Global tag sidecar embedded into the video container by mkvmerge.

use chrono::NaiveDate;

/// Comment stored in every show.
pub const TAG_COMMENT: &str = "Created with the slideshow maker.";

/// Metadata written to the Matroska global tags file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMetadata {
    /// Shown as COPYRIGHT.
    pub author: String,
    /// Shown as DESCRIPTION.
    pub epilog: String,
    /// Shown as DATE_RELEASED.
    pub date: NaiveDate,
}

impl TagMetadata {
    pub fn new(author: impl Into<String>, epilog: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            author: author.into(),
            epilog: epilog.into(),
            date,
        }
    }

    /// Render the tags XML document.
    pub fn to_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE Tags SYSTEM "matroskatags.dtd">

<Tags>
    <Tag>
        <Simple>
            <Name>DESCRIPTION</Name>
            <String>{epilog}</String>
        </Simple>
        <Simple>
            <Name>DATE_RELEASED</Name>
            <String>{date}</String>
        </Simple>
        <Simple>
            <Name>COMMENT</Name>
            <String>{comment}</String>
        </Simple>
        <Simple>
            <Name>COPYRIGHT</Name>
            <String>{author}</String>
        </Simple>
    </Tag>
</Tags>
"#,
            epilog = escape_xml(&self.epilog),
            date = self.date.format("%Y-%m-%d"),
            comment = TAG_COMMENT,
            author = escape_xml(&self.author),
        )
    }
}

/// Escape text for use inside an XML element.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
