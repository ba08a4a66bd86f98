//! Narration prompts for the app's three narrate buttons.

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::Deserialize;
use shtepy_gemini::{VOICE_CHARON, VOICE_KORE, VOICE_ZEPHYR};
use shtepy_speech::PlaybackRequest;

const DEFAULT_LEGACY_MESSAGE: &str = "This is a sacred memory intended for the chosen recipient.";

/// Which narrate button a preset reproduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetKind {
    /// Feed memory story
    Memory,
    /// Enshrined legacy message
    Legacy,
    /// Family-tree story echo
    Tree,
}

/// Prompt inputs for one narration preset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "preset", rename_all = "lowercase")]
pub enum Preset {
    Memory {
        title: String,
        author: String,
        date: String,
    },
    Legacy {
        from: String,
        #[serde(default)]
        message: Option<String>,
    },
    Tree {
        name: String,
        role: String,
        contribution: String,
        bio: String,
    },
}

impl Preset {
    /// Builds a preset from `--set key=value` pairs.
    pub fn from_fields(kind: PresetKind, fields: &[String]) -> anyhow::Result<Self> {
        let mut map = BTreeMap::new();
        map.insert("preset".to_string(), kind_name(kind).to_string());
        for field in fields {
            let Some((key, value)) = field.split_once('=') else {
                anyhow::bail!("invalid field '{}', expected key=value", field);
            };
            map.insert(key.trim().to_string(), value.to_string());
        }

        let value = serde_json::to_value(map)?;
        serde_json::from_value(value)
            .map_err(|e| anyhow::anyhow!("invalid {} preset: {}", kind_name(kind), e))
    }

    pub fn voice(&self) -> &'static str {
        match self {
            Preset::Memory { .. } => VOICE_ZEPHYR,
            Preset::Legacy { .. } => VOICE_KORE,
            Preset::Tree { .. } => VOICE_CHARON,
        }
    }

    pub fn prompt(&self) -> String {
        match self {
            Preset::Memory {
                title,
                author,
                date,
            } => format!(
                "Tell this story with a warm, prestigious family legacy tone: \"{}\". \
                 This memory belongs to {} and was captured in {}. \
                 Mention the importance of preserving this for the Shtepy lineage.",
                title, author, date
            ),
            Preset::Legacy { from, message } => {
                let message = message
                    .as_deref()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(DEFAULT_LEGACY_MESSAGE);
                format!(
                    "Read this family legacy message from {}.\n\
                     Message: \"{}\"\n\
                     Tone: Deep, prestigious, echoing through time. \
                     Start with \"An echo from the past, unveiled for you.\"",
                    from, message
                )
            }
            Preset::Tree {
                name,
                role,
                contribution,
                bio,
            } => format!(
                "Narrate the life of {}, known as {}. \
                 Use a deep, resonant, and prestigious voice. \
                 Mention their contribution: {}. End with their life philosophy: {}",
                name, role, contribution, bio
            ),
        }
    }

    pub fn to_request(&self) -> PlaybackRequest {
        PlaybackRequest::new(self.prompt(), self.voice())
    }
}

fn kind_name(kind: PresetKind) -> &'static str {
    match kind {
        PresetKind::Memory => "memory",
        PresetKind::Legacy => "legacy",
        PresetKind::Tree => "tree",
    }
}

/// Narration described in a request file: either a preset or a raw request.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NarrationFile {
    Preset(Preset),
    Request(PlaybackRequest),
}

impl NarrationFile {
    pub fn into_request(self) -> PlaybackRequest {
        match self {
            NarrationFile::Preset(preset) => preset.to_request(),
            NarrationFile::Request(request) => request,
        }
    }
}
