use std::sync::LazyLock;

use regex::Regex;
use validator::ValidateEmail;

use crate::types::NotificationError;

// Items of a literal list: ['a@x.com', "b@y.com"]
static QUOTED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"'([^']*)'|"([^"]*)""#).expect("valid quoted item regex"));

static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?1?[-.\s]?\(?([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})$")
        .expect("valid phone regex")
});

/// Parse a recipient list as stored in the environment.
///
/// Accepts a bracketed literal list with single or double quoted items, or a
/// bare comma separated list. Blank items are dropped.
pub fn parse_recipient_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();

    let quoted: Vec<String> = QUOTED_ITEM
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|item| item.as_str().trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    if !quoted.is_empty() {
        return quoted;
    }

    raw.trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse and validate a list of email recipients.
pub fn email_recipients(raw: &str) -> Result<Vec<String>, NotificationError> {
    let recipients = parse_recipient_list(raw);
    if let Some(invalid) = recipients.iter().find(|email| !email.validate_email()) {
        return Err(NotificationError::InvalidEmail(invalid.clone()));
    }
    Ok(recipients)
}

/// Parse and validate a list of SMS recipients.
pub fn sms_recipients(raw: &str) -> Result<Vec<String>, NotificationError> {
    let recipients = parse_recipient_list(raw);
    if let Some(invalid) = recipients.iter().find(|phone| !PHONE_REGEX.is_match(phone)) {
        return Err(NotificationError::InvalidPhoneNumber(invalid.clone()));
    }
    Ok(recipients)
}
