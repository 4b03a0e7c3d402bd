//! Trigger phrase matching. Exact, case-sensitive substring containment.

use twitter_client::StreamEvent;

/// True if the event's text contains any of `phrases`. Events without text never match.
pub fn matches(event: &StreamEvent, phrases: &[String]) -> bool {
    first_match(event, phrases).is_some()
}

/// First phrase (in list order) contained in the event's text.
pub fn first_match<'a>(event: &StreamEvent, phrases: &'a [String]) -> Option<&'a str> {
    let text = event.text()?;
    phrases
        .iter()
        .find(|phrase| text.contains(phrase.as_str()))
        .map(String::as_str)
}
