//! FILENAME: core/persistence/src/xml.rs
//! Small helpers around the quick-xml writer shared by the part writers.

use std::io::Cursor;

use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

pub(crate) const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub(crate) const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub(crate) type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// A writer with the standalone XML declaration already written.
pub(crate) fn document() -> Result<XmlWriter, quick_xml::Error> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

/// A writer for an XML fragment, without declaration.
pub(crate) fn fragment() -> XmlWriter {
    Writer::new(Cursor::new(Vec::new()))
}

pub(crate) fn finish(writer: XmlWriter) -> String {
    let bytes = writer.into_inner().into_inner();
    String::from_utf8_lossy(&bytes).to_string()
}

pub(crate) fn element<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
    let mut el = BytesStart::new(name);
    for &(key, value) in attrs {
        el.push_attribute((key, value));
    }
    el
}

pub(crate) fn start(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(element(name, attrs)))
}

pub(crate) fn empty(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Empty(element(name, attrs)))
}

pub(crate) fn end(writer: &mut XmlWriter, name: &str) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::End(BytesEnd::new(name)))
}

/// Days since 1899-12-30, the serial date spreadsheets store.
pub(crate) fn excel_serial(date: NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0));
    match epoch {
        Some(epoch) => (date - epoch).num_milliseconds() as f64 / 86_400_000.0,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excel_serial() {
        let date = NaiveDate::from_ymd_opt(2014, 10, 22)
            .unwrap()
            .and_hms_opt(19, 30, 0)
            .unwrap();
        assert!((excel_serial(date) - 41934.8125).abs() < 1e-9);
    }

    #[test]
    fn test_fragment_escapes_attributes() {
        let mut writer = fragment();
        empty(&mut writer, "cacheField", &[("name", "Size & <Bytes>")]).unwrap();
        assert_eq!(finish(writer), r#"<cacheField name="Size &amp; &lt;Bytes&gt;"/>"#);
    }
}
