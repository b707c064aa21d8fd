/// Tag marking callback data as a captcha response.
const PAYLOAD_TAG: &str = "captcha";

/// Prefix the transport layer uses to route callback queries here.
pub const PAYLOAD_PREFIX: &str = "captcha_";

const SEPARATOR: char = '_';
const FIELD_COUNT: usize = 5;

/// Payload attached to each captcha keyboard button.
///
/// Encoded as `captcha_{correct}_{chosen}_{user_id}_{username}`. The
/// username goes last so a username containing the separator still
/// round-trips: decoding caps the split at five fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackPayload {
    pub correct: String,
    pub chosen: String,
    pub user_id: i64,
    pub username: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Not a captcha payload")]
    Tag,
    #[error("Expected {FIELD_COUNT} fields, got {0}")]
    FieldCount(usize),
    #[error("Invalid user id: {0}")]
    InvalidId(String),
}

impl CallbackPayload {
    pub fn encode(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}{sep}{}{sep}{}",
            PAYLOAD_TAG,
            self.correct,
            self.chosen,
            self.user_id,
            self.username,
            sep = SEPARATOR,
        )
    }

    pub fn decode(data: &str) -> Result<Self, PayloadError> {
        let fields: Vec<&str> = data.splitn(FIELD_COUNT, SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return Err(PayloadError::FieldCount(fields.len()));
        }
        if fields[0] != PAYLOAD_TAG {
            return Err(PayloadError::Tag);
        }
        let user_id = fields[3]
            .parse()
            .map_err(|_| PayloadError::InvalidId(fields[3].to_string()))?;

        Ok(Self {
            correct: fields[1].to_string(),
            chosen: fields[2].to_string(),
            user_id,
            username: fields[4].to_string(),
        })
    }

    /// Whether the chosen symbol matches the correct one.
    pub fn is_correct(&self) -> bool {
        self.correct == self.chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(username: &str) -> CallbackPayload {
        CallbackPayload {
            correct: "🐬".to_string(),
            chosen: "🤖".to_string(),
            user_id: 42,
            username: username.to_string(),
        }
    }

    #[test]
    fn round_trip() {
        let original = payload("alice");
        let decoded = CallbackPayload::decode(&original.encode()).unwrap();
        assert_eq!(decoded, original);
        assert!(!decoded.is_correct());
    }

    #[test]
    fn round_trip_with_separator_in_username() {
        let original = payload("under_scored_name");
        let decoded = CallbackPayload::decode(&original.encode()).unwrap();
        assert_eq!(decoded.username, "under_scored_name");
        assert_eq!(decoded.user_id, 42);
        assert_eq!(decoded.correct, "🐬");
        assert_eq!(decoded.chosen, "🤖");
    }

    #[test]
    fn matching_symbols_are_correct() {
        let mut p = payload("alice");
        p.chosen = p.correct.clone();
        assert!(CallbackPayload::decode(&p.encode()).unwrap().is_correct());
    }

    #[test]
    fn too_few_fields_is_rejected() {
        let err = CallbackPayload::decode("captcha_🐬_42").unwrap_err();
        assert!(matches!(err, PayloadError::FieldCount(3)));
    }

    #[test]
    fn wrong_tag_is_rejected() {
        let err = CallbackPayload::decode("other_🐬_🐬_42_alice").unwrap_err();
        assert!(matches!(err, PayloadError::Tag));
    }

    #[test]
    fn non_numeric_id_is_rejected() {
        let err = CallbackPayload::decode("captcha_🐬_🐬_abc_alice").unwrap_err();
        assert!(matches!(err, PayloadError::InvalidId(_)));
    }
}
