use std::collections::HashMap;
use std::io::Write;
use std::process::{Command, Stdio};

use super::model::KokoroError;

/// Map a Kokoro voice name to an espeak-ng language code.
///
/// The first letter of the voice name encodes its language (`af_heart` is
/// American English, `bf_emma` British English, and so on).
pub fn voice_lang(voice: &str) -> &'static str {
    match voice.chars().next() {
        Some('b') => "en-gb",
        Some('e') => "es",
        Some('f') => "fr",
        Some('h') => "hi",
        Some('i') => "it",
        Some('j') => "ja",
        Some('p') => "pt-br",
        Some('z') => "cmn",
        _ => "en-us",
    }
}

/// A run of words and the punctuation mark that closed it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Clause {
    words: String,
    mark: Option<char>,
}

/// Convert text to Kokoro token ids.
///
/// espeak-ng drops punctuation from its IPA output, so the text is cut into
/// clauses first and each clause's closing mark is appended as its own token.
/// Characters missing from the vocabulary are skipped.
pub fn phonemize(
    text: &str,
    lang: &str,
    vocab: &HashMap<char, i64>,
) -> Result<Vec<i64>, KokoroError> {
    let clauses = split_clauses(text);
    let spoken: Vec<&str> = clauses
        .iter()
        .map(|clause| clause.words.as_str())
        .filter(|words| !words.is_empty())
        .collect();
    let mut ipa = transcribe(&spoken, lang)?.into_iter();

    let mut ids = Vec::new();
    for clause in &clauses {
        if !clause.words.is_empty() {
            if let Some(line) = ipa.next() {
                ids.extend(line.chars().filter_map(|ch| vocab.get(&ch).copied()));
            }
        }
        if let Some(id) = clause.mark.and_then(|mark| vocab.get(&mark).copied()) {
            ids.push(id);
        }
    }

    Ok(ids)
}

fn is_clause_mark(ch: char) -> bool {
    matches!(ch, '.' | ',' | '!' | '?' | ';' | ':' | '—' | '…')
}

fn split_clauses(text: &str) -> Vec<Clause> {
    let mut clauses = Vec::new();
    let mut words = String::new();
    let mut prev: Option<char> = None;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        // "3.5" and "1,000" stay inside the clause.
        let in_number = matches!(ch, '.' | ',')
            && prev.is_some_and(|p| p.is_ascii_digit())
            && chars.peek().is_some_and(|n| n.is_ascii_digit());

        if is_clause_mark(ch) && !in_number {
            clauses.push(Clause {
                words: words.trim().to_string(),
                mark: Some(ch),
            });
            words.clear();
        } else if ch.is_whitespace() {
            if !words.is_empty() && !words.ends_with(' ') {
                words.push(' ');
            }
        } else {
            words.push(ch);
        }
        prev = Some(ch);
    }

    let words = words.trim();
    if !words.is_empty() {
        clauses.push(Clause {
            words: words.to_string(),
            mark: None,
        });
    }
    clauses
}

/// Run espeak-ng once for all clauses, one input line per clause.
fn transcribe(clauses: &[&str], lang: &str) -> Result<Vec<String>, KokoroError> {
    if clauses.is_empty() {
        return Ok(Vec::new());
    }

    let output = run_espeak(&clauses.join("\n"), lang)?;
    let lines: Vec<String> = output
        .lines()
        .map(|line| line.trim().replace('_', ""))
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() == clauses.len() {
        return Ok(lines);
    }

    log::debug!(
        "espeak-ng returned {} lines for {} clauses, transcribing one at a time",
        lines.len(),
        clauses.len()
    );
    clauses
        .iter()
        .map(|clause| {
            let output = run_espeak(clause, lang)?;
            Ok(output
                .lines()
                .map(|line| line.trim().replace('_', ""))
                .collect::<Vec<_>>()
                .join(" "))
        })
        .collect()
}

fn run_espeak(input: &str, lang: &str) -> Result<String, KokoroError> {
    let mut child = Command::new("espeak-ng")
        .args(["--ipa", "--stdin", "-q", "-v", lang])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => KokoroError::EspeakNotFound,
            _ => KokoroError::Io(e),
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        // The last line is only flushed through espeak-ng when newline-terminated.
        stdin.write_all(input.as_bytes())?;
        if !input.ends_with('\n') {
            stdin.write_all(b"\n")?;
        }
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(KokoroError::PhonemizerFailed(format!(
            "espeak-ng exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
