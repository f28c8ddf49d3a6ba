//! Wire message decoding
//!
//! One message in, one [`Command`] out. Form detection per message:
//! a leading byte below 0x20 is a binary packet; otherwise the message is
//! tried as JSON, and only a JSON *parse* failure falls back to the legacy
//! plain-text tokens. A well-formed JSON object with an unknown `cmd` is an
//! error in its own right - it never falls through to the text forms.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::command::{Command, FontProfile};
use crate::packet;

/// Why a message was dropped
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Zero-length message or packet
    #[error("empty message")]
    Empty,
    /// JSON object with a `cmd` no dispatch arm recognizes
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    /// Known `cmd` whose fields do not deserialize
    #[error("invalid `{cmd}` payload: {source}")]
    BadPayload {
        cmd: String,
        #[source]
        source: serde_json::Error,
    },
    /// Neither a packet, a JSON command, nor a legacy token
    #[error("unrecognized message")]
    Unrecognized,
}

/// Decode one delimiter-stripped message into a command
pub fn decode_message(raw: &[u8]) -> Result<Command, DecodeError> {
    let first = *raw.first().ok_or(DecodeError::Empty)?;
    if first < packet::OPCODE_LIMIT {
        return packet::decode_packet(raw);
    }

    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(fields)) => decode_json(fields),
        // Valid JSON that is not an object carries no command
        Ok(_) => Err(DecodeError::Unrecognized),
        Err(_) => decode_legacy(raw),
    }
}

#[derive(Deserialize)]
struct WriteArgs {
    #[serde(default)]
    text: String,
    #[serde(default)]
    line: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrintLinesArgs {
    #[serde(default)]
    lines: Vec<String>,
    #[serde(default)]
    first_line: usize,
    #[serde(default = "all_lines")]
    max_lines: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrintRowsArgs {
    #[serde(default)]
    rows: Vec<Vec<String>>,
    #[serde(default)]
    first_line: usize,
    #[serde(default = "all_lines")]
    max_lines: usize,
    #[serde(default)]
    x_offset: u8,
}

#[derive(Deserialize)]
struct ScrollBarArgs {
    /// Offset fraction of display height, 0.0-1.0
    #[serde(default)]
    position: f32,
    /// Height fraction of display height, 0.0-1.0
    #[serde(default = "full_size")]
    size: f32,
}

#[derive(Deserialize)]
struct SetFontArgs {
    #[serde(default = "default_font_size")]
    size: u8,
}

#[derive(Deserialize)]
struct SetCursorArgs {
    #[serde(default)]
    x: u8,
    #[serde(default)]
    y: u8,
}

#[derive(Deserialize)]
struct SetBrightnessArgs {
    #[serde(default)]
    level: u8,
}

#[derive(Deserialize)]
struct SetPowerArgs {
    #[serde(default)]
    on: bool,
}

fn all_lines() -> usize {
    usize::MAX
}

fn full_size() -> f32 {
    1.0
}

// The legacy bridge defaulted a missing font size to the 5x7 profile
fn default_font_size() -> u8 {
    1
}

fn decode_json(fields: Map<String, Value>) -> Result<Command, DecodeError> {
    let Some(cmd) = fields.get("cmd").and_then(Value::as_str) else {
        return Err(DecodeError::Unrecognized);
    };
    let cmd = cmd.to_owned();
    let value = Value::Object(fields);

    fn args<T: serde::de::DeserializeOwned>(cmd: &str, value: Value) -> Result<T, DecodeError> {
        serde_json::from_value(value).map_err(|source| DecodeError::BadPayload {
            cmd: cmd.to_owned(),
            source,
        })
    }

    match cmd.as_str() {
        "write" => {
            let a: WriteArgs = args(&cmd, value)?;
            Ok(Command::Write {
                text: a.text,
                line: a.line,
            })
        }
        "clear" => Ok(Command::Clear),
        "printLines" => {
            let a: PrintLinesArgs = args(&cmd, value)?;
            Ok(Command::PrintLines {
                lines: a.lines,
                first_line: a.first_line,
                max_lines: a.max_lines,
            })
        }
        "printRows" => {
            let a: PrintRowsArgs = args(&cmd, value)?;
            Ok(Command::PrintRows {
                rows: a.rows,
                first_line: a.first_line,
                max_lines: a.max_lines,
                x_offset: a.x_offset,
            })
        }
        "drawScrollBar" => {
            let a: ScrollBarArgs = args(&cmd, value)?;
            Ok(Command::DrawScrollBar {
                top: 0,
                height: a.size,
                offset: a.position,
            })
        }
        "setFont" => {
            let a: SetFontArgs = args(&cmd, value)?;
            Ok(Command::SetFont(FontProfile::from_wire(a.size)))
        }
        "setCursor" => {
            let a: SetCursorArgs = args(&cmd, value)?;
            Ok(Command::SetCursor { x: a.x, y: a.y })
        }
        "setBrightness" => {
            let a: SetBrightnessArgs = args(&cmd, value)?;
            Ok(Command::SetBrightness { level: a.level })
        }
        "setPower" => {
            let a: SetPowerArgs = args(&cmd, value)?;
            Ok(Command::SetPower { on: a.on })
        }
        _ => Err(DecodeError::UnknownCommand(cmd)),
    }
}

/// Legacy plain-text forms: `clear` and `write:<text>`
fn decode_legacy(raw: &[u8]) -> Result<Command, DecodeError> {
    let text = std::str::from_utf8(raw).map_err(|_| DecodeError::Unrecognized)?;
    if text == "clear" {
        Ok(Command::Clear)
    } else if let Some(rest) = text.strip_prefix("write:") {
        Ok(Command::Write {
            text: rest.to_owned(),
            line: 0,
        })
    } else {
        Err(DecodeError::Unrecognized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Rect;

    fn decode(s: &str) -> Result<Command, DecodeError> {
        decode_message(s.as_bytes())
    }

    #[test]
    fn test_json_write() {
        let cmd = decode(r#"{"cmd":"write","text":"Hi","line":2}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Write {
                text: "Hi".into(),
                line: 2,
            }
        );
    }

    #[test]
    fn test_json_write_defaults() {
        let cmd = decode(r#"{"cmd":"write"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Write {
                text: String::new(),
                line: 0,
            }
        );
    }

    #[test]
    fn test_json_clear() {
        assert_eq!(decode(r#"{"cmd":"clear"}"#).unwrap(), Command::Clear);
    }

    #[test]
    fn test_json_print_lines() {
        let cmd = decode(r#"{"cmd":"printLines","lines":["a","b"],"firstLine":1,"maxLines":4}"#)
            .unwrap();
        assert_eq!(
            cmd,
            Command::PrintLines {
                lines: vec!["a".into(), "b".into()],
                first_line: 1,
                max_lines: 4,
            }
        );
    }

    #[test]
    fn test_json_print_rows() {
        let cmd =
            decode(r#"{"cmd":"printRows","rows":[["a","1"],["b","2"]],"xOffset":10}"#).unwrap();
        assert_eq!(
            cmd,
            Command::PrintRows {
                rows: vec![
                    vec!["a".into(), "1".into()],
                    vec!["b".into(), "2".into()],
                ],
                first_line: 0,
                max_lines: usize::MAX,
                x_offset: 10,
            }
        );
    }

    #[test]
    fn test_json_scroll_bar_maps_position_and_size() {
        let cmd = decode(r#"{"cmd":"drawScrollBar","position":0.9,"size":0.1}"#).unwrap();
        match cmd {
            Command::DrawScrollBar {
                top,
                height,
                offset,
            } => {
                assert_eq!(top, 0);
                assert!((height - 0.1).abs() < f32::EPSILON);
                assert!((offset - 0.9).abs() < f32::EPSILON);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_json_set_font() {
        assert_eq!(
            decode(r#"{"cmd":"setFont","size":2}"#).unwrap(),
            Command::SetFont(FontProfile::Size10x14)
        );
        // Missing size selects the legacy default
        assert_eq!(
            decode(r#"{"cmd":"setFont"}"#).unwrap(),
            Command::SetFont(FontProfile::Size5x7)
        );
    }

    #[test]
    fn test_json_brightness_and_power() {
        assert_eq!(
            decode(r#"{"cmd":"setBrightness","level":4}"#).unwrap(),
            Command::SetBrightness { level: 4 }
        );
        assert_eq!(
            decode(r#"{"cmd":"setPower","on":false}"#).unwrap(),
            Command::SetPower { on: false }
        );
    }

    #[test]
    fn test_unknown_cmd_is_reported_not_fallen_through() {
        let err = decode(r#"{"cmd":"blink"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownCommand(name) if name == "blink"));
    }

    #[test]
    fn test_bad_payload_names_the_command() {
        let err = decode(r#"{"cmd":"write","line":"zero"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::BadPayload { cmd, .. } if cmd == "write"));
    }

    #[test]
    fn test_legacy_equivalence_with_json() {
        // Every legacy form decodes to the same command as its JSON twin
        assert_eq!(
            decode("clear").unwrap(),
            decode(r#"{"cmd":"clear"}"#).unwrap()
        );
        assert_eq!(
            decode("write:hello world").unwrap(),
            decode(r#"{"cmd":"write","text":"hello world","line":0}"#).unwrap()
        );
    }

    #[test]
    fn test_legacy_write_keeps_colons_in_text() {
        let cmd = decode("write:a:b:c").unwrap();
        assert_eq!(
            cmd,
            Command::Write {
                text: "a:b:c".into(),
                line: 0,
            }
        );
    }

    #[test]
    fn test_binary_packet_is_detected_by_leading_opcode() {
        let cmd = decode_message(&[0x12, 0, 0, 127, 63]).unwrap();
        assert_eq!(
            cmd,
            Command::ClearArea(Rect {
                x1: 0,
                y1: 0,
                x2: 127,
                y2: 63,
            })
        );
    }

    proptest::proptest! {
        // Arbitrary bytes may be garbage but must never panic the decoder
        #[test]
        fn test_decode_total_over_arbitrary_bytes(
            data in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64)
        ) {
            let _ = decode_message(&data);
        }
    }

    #[test]
    fn test_unrecognized_forms() {
        assert!(matches!(
            decode("bogus").unwrap_err(),
            DecodeError::Unrecognized
        ));
        // Valid JSON, but not an object
        assert!(matches!(
            decode("[1,2,3]").unwrap_err(),
            DecodeError::Unrecognized
        ));
        // Object without a cmd field
        assert!(matches!(
            decode(r#"{"text":"Hi"}"#).unwrap_err(),
            DecodeError::Unrecognized
        ));
        assert!(matches!(decode("").unwrap_err(), DecodeError::Empty));
    }
}
