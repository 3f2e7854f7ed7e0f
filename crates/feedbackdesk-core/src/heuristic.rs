//! Local, network-free intent recognition for the teacher assistant.
//!
//! This tier is best effort: it recognises the common phrasings of "create an
//! observation for X" and leaves everything else to the language-model tier.
//! `for`/`of` clauses are ambiguous between a teacher and a subject; the first
//! one names the teacher unless the text is a self reference.

use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeDelta, Utc};
use regex::Regex;

use crate::types::{ParsedAction, local_to_utc};

static INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:observations?|observe|assess(?:ments?)?|evaluat(?:e|ions?)|feedback)\b")
        .expect("valid regex")
});

static CREATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcreate\b").expect("valid regex"));

static CREATE_KIND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:observation|assessment)").expect("valid regex"));

static SELF_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:self[\s-]*(?:assessment|evaluation|observation|reflection)|(?:for|about|of)\s+(?:me|myself)|my\s+own)\b",
    )
    .expect("valid regex")
});

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})\b").expect("valid regex")
});

static TODAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btoday\b").expect("valid regex"));

static TOMORROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btomorrow\b").expect("valid regex"));

/// Words that end a name or subject clause.
const STOP_WORDS: &[&str] = &[
    "in", "on", "at", "for", "of", "about", "with", "today", "tomorrow", "subject", "date",
    "please",
];

const ARTICLES: &[&str] = &["the", "a", "an", "my", "our"];

/// Titles dropped from a name; their trailing `.` does not end the clause.
const HONORIFICS: &[&str] = &["mr", "mrs", "ms", "miss", "mx", "dr", "prof", "sr", "sra"];

/// Verbs whose direct object names the teacher (`evaluate Ana Costa`).
const NAMING_VERBS: &[&str] = &["observe", "evaluate", "assess"];

const PRONOUNS: &[&str] = &["me", "myself", "us", "you", "them", "him", "her", "it"];

/// Parse `text` into an action without any I/O, or `None` if nothing matched.
pub fn parse_local(text: &str, current_user: Option<&str>) -> Option<ParsedAction> {
    parse_local_at(text, current_user, Local::now())
}

/// [`parse_local`] with an explicit clock, for relative dates.
pub fn parse_local_at(
    text: &str,
    current_user: Option<&str>,
    now: DateTime<Local>,
) -> Option<ParsedAction> {
    if !INTENT.is_match(text) {
        return None;
    }
    let user = current_user.map(str::trim).filter(|n| !n.is_empty());
    let self_bound = SELF_REFERENCE.is_match(text) && user.is_some();
    let clauses = scan_clauses(text, self_bound);

    let teacher_name = if self_bound {
        user.map(str::to_owned)
    } else {
        clauses.name
    }
    .or_else(|| {
        (CREATE.is_match(text) && CREATE_KIND.is_match(text))
            .then(|| user.map(str::to_owned))
            .flatten()
    })?;

    Some(ParsedAction::CreateObservation {
        teacher_name,
        subject: clauses.subject,
        date: extract_date(text, now),
    })
}

/// Find a date token: `DD/MM/YYYY` (also `-` or `.`, 2-digit years mean
/// 20YY) at local midnight, else `tomorrow`, else `today`.
pub fn extract_date(text: &str, now: DateTime<Local>) -> Option<DateTime<Utc>> {
    if let Some(caps) = NUMERIC_DATE.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = match &caps[3] {
            short if short.len() == 2 => format!("20{short}").parse().ok()?,
            full => full.parse().ok()?,
        };
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        return local_to_utc(date.and_time(NaiveTime::MIN));
    }
    if TOMORROW.is_match(text) {
        return Some((now + TimeDelta::days(1)).with_timezone(&Utc));
    }
    if TODAY.is_match(text) {
        return Some(now.with_timezone(&Utc));
    }
    None
}

#[derive(Debug, Default)]
struct Clauses {
    name: Option<String>,
    subject: Option<String>,
}

fn clean_word(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Walk `for|of|about|in|subject <phrase>` clauses left to right. A
/// capitalised object of `observe|evaluate|assess` also names the teacher.
fn scan_clauses(text: &str, name_bound: bool) -> Clauses {
    let words: Vec<&str> = text.split_whitespace().collect();
    let lower: Vec<String> = words.iter().map(|w| clean_word(w).to_lowercase()).collect();

    let mut clauses = Clauses::default();
    let mut name_taken = name_bound;
    let mut i = 0;
    while i < words.len() {
        let keyword = lower[i].as_str();
        let verb = NAMING_VERBS.contains(&keyword);
        let names_teacher = match keyword {
            "for" | "of" | "about" => true,
            "in" | "subject" => false,
            _ if verb => true,
            _ => {
                i += 1;
                continue;
            }
        };
        let (phrase, next) = phrase_after(&words, &lower, i + 1);
        i = next;
        if phrase.is_empty() || PRONOUNS.contains(&phrase.to_lowercase().as_str()) {
            continue;
        }
        if verb {
            if !name_taken && phrase.starts_with(char::is_uppercase) {
                clauses.name = Some(phrase);
                name_taken = true;
            }
        } else if names_teacher && !name_taken {
            clauses.name = Some(phrase);
            name_taken = true;
        } else if clauses.subject.is_none() && keyword != "about" {
            clauses.subject = Some(phrase);
        }
    }
    clauses
}

/// Collect the words of one clause starting at `start`. Returns the phrase
/// with punctuation and titles stripped and the index of the first
/// unconsumed word.
fn phrase_after(words: &[&str], lower: &[String], start: usize) -> (String, usize) {
    let mut i = start;
    while i < words.len() && ARTICLES.contains(&lower[i].as_str()) {
        i += 1;
    }
    let mut parts: Vec<&str> = Vec::new();
    while i < words.len() {
        let word = lower[i].as_str();
        if word.is_empty()
            || STOP_WORDS.contains(&word)
            || word.chars().any(|c| c.is_ascii_digit())
        {
            break;
        }
        let title = HONORIFICS.contains(&word);
        if !title {
            parts.push(clean_word(words[i]));
        }
        let ends_clause = words[i].ends_with([',', ';', ':', '!', '?'])
            || (words[i].ends_with('.') && !title);
        i += 1;
        if ends_clause {
            break;
        }
    }
    (parts.join(" "), i)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
