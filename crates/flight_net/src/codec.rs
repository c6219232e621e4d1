//! Text codec.
//!
//! Payloads are UTF-8, whitespace-tokenised and case-sensitive. Unknown
//! tokens stop at this boundary as a [`ParseError`]; receivers log and drop.

use crate::error::ParseError;
use crate::messages::{
    Actuator, ActuatorAck, ActuatorCommand, FeedbackReading, GeneratorStop, Message, ModeSignal,
    ModeTarget, Sensor, SensorDelta, Verb,
};

/// Encode a message to its wire bytes.
#[must_use]
pub fn encode(message: &Message) -> Vec<u8> {
    message.to_string().into_bytes()
}

/// Decode a message from wire bytes.
///
/// # Errors
///
/// Returns [`ParseError::InvalidUtf8`] for non-UTF-8 payloads, otherwise any
/// error from [`parse`].
pub fn decode(bytes: &[u8]) -> Result<Message, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8)?;
    parse(text)
}

/// Parse a message from its wire text.
///
/// # Errors
///
/// Returns a [`ParseError`] describing the first problem found.
pub fn parse(text: &str) -> Result<Message, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    // Mode signals are free text recognised by keyword.
    for target in [ModeTarget::Shutdown, ModeTarget::Landing] {
        if text.contains(target.keyword()) {
            return Ok(Message::ModeSignal(parse_mode_signal(text, target)));
        }
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();

    if text.contains(" sensor new reading ") {
        return parse_feedback(&tokens).map(Message::FeedbackReading);
    }

    let head = tokens[0];
    if head == "shutdown" {
        return parse_generator_stop(&tokens).map(Message::GeneratorStop);
    }
    if let Ok(verb) = head.parse::<Verb>() {
        return parse_command(verb, &tokens).map(Message::ActuatorCommand);
    }
    if let Ok(sensor) = head.parse::<Sensor>() {
        return parse_delta(sensor, &tokens).map(Message::SensorDelta);
    }
    if let Ok(actuator) = head.parse::<Actuator>() {
        return parse_ack(actuator, &tokens).map(Message::ActuatorAck);
    }

    Err(match tokens.len() {
        3 => ParseError::UnknownSensor(head.to_string()),
        4 => ParseError::UnknownActuator(head.to_string()),
        _ => ParseError::Malformed(text.to_string()),
    })
}

fn parse_mode_signal(text: &str, target: ModeTarget) -> ModeSignal {
    let subject = match text.rfind(" for ") {
        Some(idx) => &text[idx + " for ".len()..],
        None => &text[text.find(target.keyword()).map_or(0, |i| i + target.keyword().len())..],
    };
    ModeSignal::new(target, subject.trim())
}

fn expect_len(tokens: &[&str], expected: usize) -> Result<(), ParseError> {
    if tokens.len() == expected {
        Ok(())
    } else {
        Err(ParseError::FieldCount {
            expected,
            found: tokens.len(),
        })
    }
}

fn expect_keyword(token: &str, keyword: &str) -> Result<(), ParseError> {
    if token == keyword {
        Ok(())
    } else {
        Err(ParseError::Malformed(format!(
            "expected `{keyword}`, found `{token}`"
        )))
    }
}

fn parse_magnitude(token: &str) -> Result<i32, ParseError> {
    match token.parse::<i32>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(ParseError::InvalidMagnitude(token.to_string())),
    }
}

fn parse_delta(sensor: Sensor, tokens: &[&str]) -> Result<SensorDelta, ParseError> {
    expect_len(tokens, 3)?;
    let direction = tokens[1].parse()?;
    let magnitude = parse_magnitude(tokens[2])?;
    Ok(SensorDelta::new(sensor, direction, magnitude))
}

fn parse_actuator_list(token: &str) -> Result<Vec<Actuator>, ParseError> {
    let inner = token
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(|| ParseError::Malformed(format!("expected [actuator,...], found `{token}`")))?;
    if inner.is_empty() {
        return Err(ParseError::Malformed("empty actuator list".to_string()));
    }
    inner.split(',').map(|name| name.trim().parse()).collect()
}

fn parse_command(verb: Verb, tokens: &[&str]) -> Result<ActuatorCommand, ParseError> {
    let (keyword, min_len) = match verb {
        Verb::Open | Verb::Close => ("by", 2),
        Verb::Deploy => ("to", 4),
        Verb::Increase | Verb::Decrease => ("by", 4),
    };
    if tokens.len() != min_len && tokens.len() != 4 {
        return Err(ParseError::FieldCount {
            expected: min_len,
            found: tokens.len(),
        });
    }
    let actuators = parse_actuator_list(tokens[1])?;
    let magnitude = if tokens.len() == 4 {
        expect_keyword(tokens[2], keyword)?;
        parse_magnitude(tokens[3])?
    } else {
        0
    };
    Ok(ActuatorCommand {
        verb,
        actuators,
        magnitude,
    })
}

fn parse_ack(actuator: Actuator, tokens: &[&str]) -> Result<ActuatorAck, ParseError> {
    expect_len(tokens, 4)?;
    let verb: Verb = tokens[1].parse()?;
    if !actuator.accepts(verb) {
        return Err(ParseError::VerbMismatch { actuator, verb });
    }
    expect_keyword(tokens[2], "by")?;
    let magnitude = parse_magnitude(tokens[3])?;
    Ok(ActuatorAck::new(actuator, verb, magnitude))
}

fn parse_feedback(tokens: &[&str]) -> Result<FeedbackReading, ParseError> {
    expect_len(tokens, 6)?;
    let sensor = tokens[0].parse()?;
    let value = tokens[5]
        .parse()
        .map_err(|_| ParseError::InvalidMagnitude(tokens[5].to_string()))?;
    Ok(FeedbackReading { sensor, value })
}

fn parse_generator_stop(tokens: &[&str]) -> Result<GeneratorStop, ParseError> {
    expect_len(tokens, 3)?;
    expect_keyword(tokens[2], "generator")?;
    let sensor = tokens[1].parse()?;
    Ok(GeneratorStop { sensor })
}
