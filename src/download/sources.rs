//! 固定的音频源列表（按优先级排序）与 URL 生成。

use super::models::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStyle {
    /// `001`, `002`, ...
    Padded,
    /// `1`, `2`, ...
    Plain,
}

impl IndexStyle {
    pub fn format(self, id: ItemId) -> String {
        match self {
            IndexStyle::Padded => format!("{:03}", id.get()),
            IndexStyle::Plain => id.get().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source {
    pub name: &'static str,
    /// URL with a single `{id}` placeholder.
    pub url_template: &'static str,
    pub style: IndexStyle,
}

impl Source {
    pub fn render_url(&self, id: ItemId) -> String {
        self.url_template.replace("{id}", &self.style.format(id))
    }
}

/// Sources in order of preference.
pub const SOURCES: [Source; 3] = [
    Source {
        name: "Islamic Finder",
        url_template: "https://www.islamicfinder.us/audios/asma-ul-husna/{id}.mp3",
        style: IndexStyle::Padded,
    },
    Source {
        name: "GitHub Repository",
        url_template: "https://raw.githubusercontent.com/soachishti/Asma-ul-Husna/master/audio/{id}.mp3",
        style: IndexStyle::Plain,
    },
    Source {
        name: "Islamic Network",
        url_template: "https://cdn.islamic.network/quran/audio/128/ar.alafasy/{id}.mp3",
        style: IndexStyle::Plain,
    },
];
