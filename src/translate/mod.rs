//! Page translation: language set, backend adapter trait, caches, snapshot
//! store and the batch orchestrator.

pub mod batch;
pub mod cache;
pub mod deepseek;
pub mod libre;
pub mod snapshot;
pub mod sqlite_cache;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TranslateError;

pub use batch::TranslationService;
pub use cache::TranslationCache;
pub use snapshot::OriginalTextStore;

/// Languages a page can be shown in. `En` is the source language of every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    En,
    Ka,
    Hn,
    Fn,
}

impl Language {
    pub const SOURCE: Language = Language::En;
    pub const ALL: [Language; 4] = [Language::En, Language::Ka, Language::Hn, Language::Fn];

    /// Code used by pages, cookies and cache keys.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ka => "ka",
            Language::Hn => "hn",
            Language::Fn => "fn",
        }
    }

    /// ISO 639-1 code understood by remote backends.
    pub fn iso_code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ka => "kn",
            Language::Hn => "hi",
            Language::Fn => "fr",
        }
    }

    pub fn english_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ka => "Kannada",
            Language::Hn => "Hindi",
            Language::Fn => "French",
        }
    }

    pub fn is_source(self) -> bool {
        self == Self::SOURCE
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language code: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Language::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

impl TryFrom<String> for Language {
    type Error = UnknownLanguage;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.code().to_string()
    }
}

/// Remote translation backend (adapter for different services).
/// Implementations translate from the source language into `target`.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn translate(&self, text: &str, target: Language) -> Result<String, TranslateError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted backends for orchestrator and API tests.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    pub enum Behaviour {
        /// `[lang] text`
        Prefix,
        /// Returns the input unchanged.
        Echo,
        Fail,
        /// Sleeps, then behaves like `Prefix`.
        Slow(Duration),
        /// Fixed answers; anything else fails.
        Table(HashMap<String, String>),
    }

    pub struct ScriptedBackend {
        pub name: &'static str,
        pub behaviour: Behaviour,
        pub calls: AtomicUsize,
    }

    impl ScriptedBackend {
        pub fn new(name: &'static str, behaviour: Behaviour) -> Self {
            Self {
                name,
                behaviour,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TranslationBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn translate(&self, text: &str, target: Language) -> Result<String, TranslateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Prefix => Ok(format!("[{}] {}", target.code(), text)),
                Behaviour::Echo => Ok(text.to_string()),
                Behaviour::Fail => Err(TranslateError::ApiError("scripted failure".into())),
                Behaviour::Slow(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(format!("[{}] {}", target.code(), text))
                }
                Behaviour::Table(table) => table
                    .get(text)
                    .cloned()
                    .ok_or_else(|| TranslateError::ApiError("not in table".into())),
            }
        }
    }
}
