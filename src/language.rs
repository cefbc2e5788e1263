use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages the rule set can be compiled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    Fr,
    EnUs,
    Es,
    It,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::Fr, Language::EnUs, Language::Es, Language::It];

    /// Language the rules are authored in unless told otherwise.
    pub const DEFAULT_SOURCE: Language = Language::Fr;

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::EnUs => "en-us",
            Language::Es => "es",
            Language::It => "it",
        }
    }

    /// Every supported language except `source`, in declaration order.
    pub fn targets_for(source: Language) -> Vec<Language> {
        Self::ALL.into_iter().filter(|l| *l != source).collect()
    }

    /// Substitute this language into a `{lang}` file name template.
    pub fn render(self, template: &str) -> String {
        template.replace(LANG_PLACEHOLDER, self.as_str())
    }
}

/// Placeholder replaced by the language code in path templates.
pub const LANG_PLACEHOLDER: &str = "{lang}";

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("the language '{s}' is not supported"))
    }
}
