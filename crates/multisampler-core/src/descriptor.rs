//! Multisample descriptor rendering.
//!
//! The descriptor is the `multisample.xml` document inside a `.multisample`
//! package. The consuming application reads numbers by fixed-point
//! convention, so every fixed field is written with a fixed number of
//! decimals.

use crate::error::{Error, Result};
use crate::types::{Fade, Range, ValueMode, Zone};
use crate::zones::ZoneSettings;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// File name of the descriptor inside the package.
pub const DESCRIPTOR_FILE: &str = "multisample.xml";

const GENERATOR: &str = "Bitwig Studio";
const LAYER_NAME: &str = "Default";
const ZONE_LOGIC: &str = "always-play";
const INDENT: usize = 3;

const GAIN: f64 = 0.0;
const TRACK: f64 = 1.0;
const TUNE: f64 = 0.0;
const SAMPLE_START: f64 = 0.0;
const SAMPLE_STOP: f64 = 0.0;
const LOOP_FADE: f64 = 0.0;
const LOOP_START: f64 = 0.0;

/// Metadata written on the root element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstrumentInfo {
    pub name: String,
    pub author: String,
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// Render the descriptor for a zone list.
///
/// Velocity fades are only written in velocity mode. Selection fades are only
/// written in selection mode or for zones whose selection was redistributed.
/// The same zones and settings always give the same bytes.
pub fn render_descriptor(
    info: &InstrumentInfo,
    zones: &[Zone],
    settings: &ZoneSettings,
) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', INDENT);

    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write(
        &mut writer,
        Event::Start(element("multisample", &[("name", info.name.clone())])),
    )?;

    text_element(&mut writer, "generator", GENERATOR)?;
    text_element(&mut writer, "category", "")?;
    text_element(&mut writer, "creator", &info.author)?;
    text_element(&mut writer, "description", "")?;
    text_element(&mut writer, "keywords", "")?;

    write(
        &mut writer,
        Event::Start(element("layer", &[("name", LAYER_NAME.to_string())])),
    )?;
    for zone in zones {
        write_zone(&mut writer, zone, settings)?;
    }
    write(&mut writer, Event::End(BytesEnd::new("layer")))?;
    write(&mut writer, Event::End(BytesEnd::new("multisample")))?;

    let bytes = writer.into_inner().into_inner();
    let mut xml = String::from_utf8(bytes).map_err(|e| Error::Xml(e.to_string()))?;
    xml.push('\n');
    Ok(xml)
}

fn write_zone(writer: &mut XmlWriter, zone: &Zone, settings: &ZoneSettings) -> Result<()> {
    let sample = element(
        "sample",
        &[
            ("file", zone.source_name.clone()),
            ("gain", format!("{:.2}", GAIN)),
            ("parameter-1", zone.key.to_string()),
            ("parameter-2", zone.active(settings.mode).high.to_string()),
            ("parameter-3", "0".to_string()),
            ("reverse", "false".to_string()),
            ("sample-start", format!("{:.3}", SAMPLE_START)),
            ("sample-stop", format!("{:.3}", SAMPLE_STOP)),
            ("zone-logic", ZONE_LOGIC.to_string()),
        ],
    );
    write(writer, Event::Start(sample))?;

    let mut key = range_attributes(zone.key_range, zone.key_fade);
    key.extend([
        ("root", zone.key.to_string()),
        ("track", format!("{:.4}", TRACK)),
        ("tune", format!("{:.2}", TUNE)),
    ]);
    write(writer, Event::Empty(element("key", &key)))?;

    let velocity_fade = if settings.mode == ValueMode::Velocity {
        zone.velocity_fade
    } else {
        Fade::NONE
    };
    let velocity = range_attributes(zone.velocity, velocity_fade);
    write(writer, Event::Empty(element("velocity", &velocity)))?;

    let select_fade = if settings.mode == ValueMode::Selection || zone.redistributed {
        zone.select_fade
    } else {
        Fade::NONE
    };
    let select = range_attributes(zone.select, select_fade);
    write(writer, Event::Empty(element("select", &select)))?;

    let looping = element(
        "loop",
        &[
            ("fade", format!("{:.4}", LOOP_FADE)),
            ("mode", "off".to_string()),
            ("start", format!("{:.3}", LOOP_START)),
        ],
    );
    write(writer, Event::Empty(looping))?;

    write(writer, Event::End(BytesEnd::new("sample")))
}

fn range_attributes(range: Range, fade: Fade) -> Vec<(&'static str, String)> {
    vec![
        ("low", range.low.to_string()),
        ("high", range.high.to_string()),
        ("low-fade", fade.low.to_string()),
        ("high-fade", fade.high.to_string()),
    ]
}

fn element(name: &str, attributes: &[(&str, String)]) -> BytesStart<'static> {
    let mut elem = BytesStart::new(name.to_string());
    for (attr, value) in attributes {
        elem.push_attribute((*attr, value.as_str()));
    }
    elem
}

fn text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<()> {
    if text.is_empty() {
        return write(writer, Event::Empty(BytesStart::new(name)));
    }
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

fn write(writer: &mut XmlWriter, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Xml(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filename::parse_filename;
    use crate::zones::assign_zones;

    fn zones_for(names: &[&str], settings: &ZoneSettings) -> Vec<Zone> {
        let descs: Vec<_> = names
            .iter()
            .map(|name| parse_filename(name, settings.mode).unwrap())
            .collect();
        assign_zones(&descs, settings).unwrap()
    }

    fn info() -> InstrumentInfo {
        InstrumentInfo {
            name: "Piano".to_string(),
            author: "Someone".to_string(),
        }
    }

    #[test]
    fn test_render_header_and_layer() {
        let settings = ZoneSettings::default();
        let xml = render_descriptor(&info(), &zones_for(&["C3.wav"], &settings), &settings).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<multisample name="Piano">"#));
        assert!(xml.contains("<generator>Bitwig Studio</generator>"));
        assert!(xml.contains("<creator>Someone</creator>"));
        assert!(xml.contains(r#"<layer name="Default">"#));
        assert!(xml.trim_end().ends_with("</multisample>"));
        assert_eq!(xml.matches("<sample ").count(), 1);
    }

    #[test]
    fn test_render_zone_attributes() {
        let settings = ZoneSettings::default();
        let xml = render_descriptor(
            &info(),
            &zones_for(&["C3.wav", "D3.wav"], &settings),
            &settings,
        )
        .unwrap();

        assert!(xml.contains(
            r#"<sample file="C3.wav" gain="0.00" parameter-1="48" parameter-2="127" parameter-3="0" reverse="false" sample-start="0.000" sample-stop="0.000" zone-logic="always-play">"#
        ));
        assert!(xml.contains(
            r#"<key low="0" high="49" low-fade="0" high-fade="0" root="48" track="1.0000" tune="0.00"/>"#
        ));
        assert!(xml.contains(
            r#"<key low="50" high="127" low-fade="0" high-fade="0" root="50" track="1.0000" tune="0.00"/>"#
        ));
        assert!(xml.contains(r#"<velocity low="0" high="127" low-fade="0" high-fade="0"/>"#));
        assert!(xml.contains(r#"<select low="0" high="127" low-fade="0" high-fade="0"/>"#));
        assert!(xml.contains(r#"<loop fade="0.0000" mode="off" start="0.000"/>"#));
    }

    #[test]
    fn test_fades_follow_mode() {
        let settings = ZoneSettings {
            secondary_fade: 4,
            ..Default::default()
        };
        let xml = render_descriptor(
            &info(),
            &zones_for(&["C3-40.wav", "C3.wav"], &settings),
            &settings,
        )
        .unwrap();
        assert!(xml.contains(r#"<velocity low="0" high="40" low-fade="0" high-fade="4"/>"#));
        assert!(xml.contains(r#"<velocity low="41" high="127" low-fade="4" high-fade="0"/>"#));

        let settings = ZoneSettings {
            mode: ValueMode::Selection,
            secondary_fade: 4,
            ..Default::default()
        };
        let xml = render_descriptor(
            &info(),
            &zones_for(&["C3-40.wav", "C3.wav"], &settings),
            &settings,
        )
        .unwrap();
        assert!(xml.contains(r#"<select low="0" high="40" low-fade="0" high-fade="4"/>"#));
        assert!(xml.contains(r#"<velocity low="0" high="127" low-fade="0" high-fade="0"/>"#));
    }

    #[test]
    fn test_redistributed_select_fades_written() {
        let settings = ZoneSettings {
            redistribute_fade: Some(3),
            ..Default::default()
        };
        let xml = render_descriptor(
            &info(),
            &zones_for(&["C3 a.wav", "C3 b.wav"], &settings),
            &settings,
        )
        .unwrap();
        assert!(xml.contains(r#"<select low="0" high="66" low-fade="0" high-fade="3"/>"#));
        assert!(xml.contains(r#"<select low="61" high="127" low-fade="3" high-fade="0"/>"#));
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let settings = ZoneSettings::default();
        let info = InstrumentInfo {
            name: "Keys & \"Pads\"".to_string(),
            author: "A <B>".to_string(),
        };
        let xml = render_descriptor(&info, &zones_for(&["Drum & Bass C3.wav"], &settings), &settings).unwrap();
        assert!(xml.contains(r#"name="Keys &amp; &quot;Pads&quot;""#));
        assert!(xml.contains("<creator>A &lt;B&gt;</creator>"));
        assert!(xml.contains(r#"file="Drum &amp; Bass C3.wav""#));
    }

    #[test]
    fn test_render_is_deterministic() {
        let settings = ZoneSettings {
            key_fade: 2,
            secondary_fade: 5,
            ..Default::default()
        };
        let names = ["C2.wav", "C3-50.wav", "C3.wav", "G4.wav"];
        let first = render_descriptor(&info(), &zones_for(&names, &settings), &settings).unwrap();
        let second = render_descriptor(&info(), &zones_for(&names, &settings), &settings).unwrap();
        assert_eq!(first, second);
    }
}
