use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::result::ZipError;
use zip::ZipArchive;

use super::model::{KokoroError, STYLE_DIM};
use super::phonemizer::voice_lang;

/// Style vectors of one Kokoro voice: the engine's voice state.
///
/// Row `n` of the table conditions an utterance of `n` phoneme tokens.
#[derive(Debug, Clone)]
pub struct KokoroVoice {
    lang: &'static str,
    styles: Vec<[f32; STYLE_DIM]>,
}

impl KokoroVoice {
    /// espeak-ng language code derived from the voice prefix.
    pub fn lang(&self) -> &'static str {
        self.lang
    }

    /// Style vector for an utterance of `token_count` tokens, clamped to the table.
    pub fn style(&self, token_count: usize) -> &[f32; STYLE_DIM] {
        &self.styles[token_count.min(self.styles.len() - 1)]
    }
}

/// Read the `<name>.npy` entry of a Kokoro `.npz` voice archive.
pub fn load_voice(archive_path: &Path, name: &str) -> Result<KokoroVoice, KokoroError> {
    let mut archive = open_archive(archive_path)?;
    let entry_name = format!("{name}.npy");

    let mut entry = match archive.by_name(&entry_name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Err(KokoroError::VoiceNotFound(name.to_string())),
        Err(e) => return Err(KokoroError::VoiceParse(format!("{entry_name}: {e}"))),
    };

    let mut data = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut data)?;

    let styles = parse_style_table(&data, &entry_name)?;
    log::debug!("Read {} style vectors for voice {name}", styles.len());

    Ok(KokoroVoice {
        lang: voice_lang(name),
        styles,
    })
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>, KokoroError> {
    let file = File::open(path)?;
    ZipArchive::new(file)
        .map_err(|e| KokoroError::VoiceParse(format!("{}: {e}", path.display())))
}

/// Parse a little-endian float32 `.npy` array into rows of `STYLE_DIM` floats.
fn parse_style_table(data: &[u8], name: &str) -> Result<Vec<[f32; STYLE_DIM]>, KokoroError> {
    let invalid = |reason: String| KokoroError::VoiceParse(format!("{name}: {reason}"));

    if data.len() < 10 || &data[..6] != b"\x93NUMPY" {
        return Err(invalid("not a .npy file".to_string()));
    }

    // Version 1 stores the header length in a u16, versions 2 and 3 in a u32.
    let (header_start, header_len) = match data[6] {
        1 => (10, u16::from_le_bytes([data[8], data[9]]) as usize),
        2 | 3 if data.len() >= 12 => (
            12,
            u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize,
        ),
        version => return Err(invalid(format!("unsupported .npy version {version}"))),
    };

    let body_start = header_start + header_len;
    let header = data
        .get(header_start..body_start)
        .ok_or_else(|| invalid("truncated header".to_string()))?;
    let header = String::from_utf8_lossy(header);
    if !header.contains("'<f4'") {
        return Err(invalid(format!("expected little-endian float32, header {header:?}")));
    }

    let row_bytes = STYLE_DIM * 4;
    let body = &data[body_start..];
    if body.is_empty() || body.len() % row_bytes != 0 {
        return Err(invalid(format!(
            "{} data bytes is not a whole number of {STYLE_DIM}-float rows",
            body.len()
        )));
    }

    Ok(body
        .chunks_exact(row_bytes)
        .map(|row| {
            let mut style = [0f32; STYLE_DIM];
            for (value, bytes) in style.iter_mut().zip(row.chunks_exact(4)) {
                *value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            style
        })
        .collect())
}
