//! Recorded input sessions, stored as JSON lines.
//!
//! The first line is a [`ReplayHeader`]; every following non-blank line is one
//! [`ReplayEvent`], applied in file order.

use std::fmt;
use std::io::{BufRead, Write};

use model::Vec2i;
use protocol::InputFrame;
use serde::{Deserialize, Serialize};

pub const REPLAY_SCHEMA_VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayHeader {
    pub schema_version: u16,
    pub screen_size: Vec2i,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayEvent {
    Resize { pan_delta: Vec2i, screen_size: Vec2i },
    Input(InputFrame),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySession {
    pub schema_version: u16,
    pub screen_size: Vec2i,
    pub events: Vec<ReplayEvent>,
}

impl ReplaySession {
    pub fn new(screen_size: Vec2i) -> Self {
        Self {
            schema_version: REPLAY_SCHEMA_VERSION,
            screen_size,
            events: Vec::new(),
        }
    }

    pub fn header(&self) -> ReplayHeader {
        ReplayHeader {
            schema_version: self.schema_version,
            screen_size: self.screen_size,
        }
    }

    pub fn push_input(&mut self, frame: InputFrame) {
        self.events.push(ReplayEvent::Input(frame));
    }

    pub fn push_resize(&mut self, pan_delta: Vec2i, screen_size: Vec2i) {
        self.events.push(ReplayEvent::Resize {
            pan_delta,
            screen_size,
        });
    }

    pub fn input_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, ReplayEvent::Input(_)))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    Io(String),
    Parse { line_number: usize, message: String },
    UnsupportedSchema { found: u16, expected: u16 },
    EmptySession,
    NegativeScreenSize { event_index: Option<usize> },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::Io(message) => write!(formatter, "replay io failed: {message}"),
            ReplayError::Parse {
                line_number,
                message,
            } => write!(
                formatter,
                "parse replay JSON at line {line_number} failed: {message}"
            ),
            ReplayError::UnsupportedSchema { found, expected } => write!(
                formatter,
                "replay schema version {found} is not supported (expected {expected})"
            ),
            ReplayError::EmptySession => write!(formatter, "replay holds no header"),
            ReplayError::NegativeScreenSize {
                event_index: Some(event_index),
            } => write!(
                formatter,
                "replay event {event_index} resizes to a negative screen size"
            ),
            ReplayError::NegativeScreenSize { event_index: None } => {
                write!(formatter, "replay header has a negative screen size")
            }
        }
    }
}

impl std::error::Error for ReplayError {}

impl From<std::io::Error> for ReplayError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

pub fn validate_session(session: &ReplaySession) -> Result<(), ReplayError> {
    if session.schema_version != REPLAY_SCHEMA_VERSION {
        return Err(ReplayError::UnsupportedSchema {
            found: session.schema_version,
            expected: REPLAY_SCHEMA_VERSION,
        });
    }
    if is_negative(session.screen_size) {
        return Err(ReplayError::NegativeScreenSize { event_index: None });
    }
    for (event_index, event) in session.events.iter().enumerate() {
        let ReplayEvent::Resize { screen_size, .. } = event else {
            continue;
        };
        if is_negative(*screen_size) {
            return Err(ReplayError::NegativeScreenSize {
                event_index: Some(event_index),
            });
        }
    }
    Ok(())
}

fn is_negative(size: Vec2i) -> bool {
    size.x < 0 || size.y < 0
}

pub fn write_session(writer: &mut dyn Write, session: &ReplaySession) -> Result<(), ReplayError> {
    write_json_line(writer, &session.header())?;
    for event in &session.events {
        write_json_line(writer, event)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json_line<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), ReplayError> {
    serde_json::to_writer(&mut *writer, value)
        .map_err(|error| ReplayError::Io(format!("serialize replay line failed: {error}")))?;
    writer.write_all(b"\n")?;
    Ok(())
}

pub fn read_session(reader: &mut dyn BufRead) -> Result<ReplaySession, ReplayError> {
    let mut header = None::<ReplayHeader>;
    let mut events = Vec::new();
    let mut line_buffer = String::new();
    let mut line_number = 0usize;
    loop {
        line_buffer.clear();
        let bytes = reader.read_line(&mut line_buffer)?;
        if bytes == 0 {
            break;
        }
        line_number += 1;
        if line_buffer.trim().is_empty() {
            continue;
        }
        let parse_error = |error: serde_json::Error| ReplayError::Parse {
            line_number,
            message: error.to_string(),
        };
        if header.is_none() {
            header = Some(serde_json::from_str(&line_buffer).map_err(parse_error)?);
        } else {
            events.push(serde_json::from_str(&line_buffer).map_err(parse_error)?);
        }
    }

    let header = header.ok_or(ReplayError::EmptySession)?;
    let session = ReplaySession {
        schema_version: header.schema_version,
        screen_size: header.screen_size,
        events,
    };
    validate_session(&session)?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::InputFlags;

    fn stroke_session() -> ReplaySession {
        let mut session = ReplaySession::new(Vec2i::new(320, 200));
        session.push_input(InputFrame::point(Vec2i::new(10, 10)));
        session.push_input(InputFrame::point(Vec2i::new(40, 12)));
        session.push_input(InputFrame::flags(InputFlags::END_STROKE));
        session.push_resize(Vec2i::new(3, -2), Vec2i::new(300, 180));
        session
    }

    #[test]
    fn written_session_reads_back_unchanged() {
        let session = stroke_session();
        let mut bytes = Vec::new();
        write_session(&mut bytes, &session).expect("write session");
        assert_eq!(
            bytes.iter().filter(|byte| **byte == b'\n').count(),
            1 + session.events.len()
        );

        let mut reader = std::io::BufReader::new(bytes.as_slice());
        let parsed = read_session(&mut reader).expect("read session");
        assert_eq!(parsed, session);
        assert_eq!(parsed.input_count(), 3);
    }

    #[test]
    fn reads_hand_written_sparse_events() {
        let text = r#"
{"schema_version":1,"screen_size":{"x":64,"y":48}}

{"input":{"point":{"x":4,"y":9}}}
{"resize":{"pan_delta":{"x":1,"y":0},"screen_size":{"x":64,"y":48}}}
"#;
        let session = read_session(&mut text.as_bytes()).expect("read session");
        assert_eq!(session.screen_size, Vec2i::new(64, 48));
        assert_eq!(
            session.events,
            vec![
                ReplayEvent::Input(InputFrame::point(Vec2i::new(4, 9))),
                ReplayEvent::Resize {
                    pan_delta: Vec2i::new(1, 0),
                    screen_size: Vec2i::new(64, 48),
                },
            ]
        );
    }

    #[test]
    fn empty_input_has_no_session() {
        assert_eq!(
            read_session(&mut "\n\n".as_bytes()),
            Err(ReplayError::EmptySession)
        );
    }

    #[test]
    fn unknown_schema_version_is_rejected() {
        let text = r#"{"schema_version":7,"screen_size":{"x":1,"y":1}}"#;
        assert_eq!(
            read_session(&mut text.as_bytes()),
            Err(ReplayError::UnsupportedSchema {
                found: 7,
                expected: REPLAY_SCHEMA_VERSION,
            })
        );
    }

    #[test]
    fn parse_errors_carry_the_line_number() {
        let text = "{\"schema_version\":1,\"screen_size\":{\"x\":1,\"y\":1}}\n{\"input\":\n";
        match read_session(&mut text.as_bytes()) {
            Err(ReplayError::Parse { line_number, .. }) => assert_eq!(line_number, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn negative_resize_is_rejected() {
        let mut session = stroke_session();
        session.push_resize(Vec2i::ZERO, Vec2i::new(-1, 5));
        assert_eq!(
            validate_session(&session),
            Err(ReplayError::NegativeScreenSize {
                event_index: Some(4)
            })
        );
    }
}
