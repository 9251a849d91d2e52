//! The color scheme table.
//!
//! A scheme file (`colors/<name>.clifm`) is `KEY=SGR` pairs where SGR is the
//! parameter part of an ANSI escape (`01;34`). File entries reference scheme
//! colors by [`ColorKey`]; per-extension colors (`ext:rs=00;33`) are owned by
//! the entry that matched them. Built-in defaults cover every key so lookup
//! never fails.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::warn;

/// File-type and interface color classes, in classification precedence order
/// for the file-type portion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorKey {
    BrokenLink,
    LinkDir,
    Link,
    StickyOtherWritableDir,
    OtherWritableDir,
    StickyDir,
    Dir,
    EmptyDir,
    Suid,
    Sgid,
    Capability,
    Exec,
    EmptyFile,
    MultiHardlink,
    Socket,
    Fifo,
    BlockDev,
    CharDev,
    Regular,
    Unknown,
    // Interface colors.
    Eln,
    SelMarker,
    Trim,
    Prompt,
    Warning,
}

impl ColorKey {
    fn rc_name(self) -> &'static str {
        match self {
            Self::BrokenLink => "or",
            Self::LinkDir => "ln_dir",
            Self::Link => "ln",
            Self::StickyOtherWritableDir => "tw",
            Self::OtherWritableDir => "ow",
            Self::StickyDir => "st",
            Self::Dir => "di",
            Self::EmptyDir => "ed",
            Self::Suid => "su",
            Self::Sgid => "sg",
            Self::Capability => "ca",
            Self::Exec => "ex",
            Self::EmptyFile => "ef",
            Self::MultiHardlink => "mh",
            Self::Socket => "so",
            Self::Fifo => "pi",
            Self::BlockDev => "bd",
            Self::CharDev => "cd",
            Self::Regular => "fi",
            Self::Unknown => "uf",
            Self::Eln => "el",
            Self::SelMarker => "sb",
            Self::Trim => "tt",
            Self::Prompt => "pr",
            Self::Warning => "wp",
        }
    }

    fn default_sgr(self) -> &'static str {
        match self {
            Self::BrokenLink => "02;04;31",
            Self::LinkDir => "01;36",
            Self::Link => "01;36",
            Self::StickyOtherWritableDir => "30;42",
            Self::OtherWritableDir => "34;42",
            Self::StickyDir => "37;44",
            Self::Dir => "01;34",
            Self::EmptyDir => "02;34",
            Self::Suid => "37;41",
            Self::Sgid => "30;43",
            Self::Capability => "30;41",
            Self::Exec => "01;32",
            Self::EmptyFile => "02;37",
            Self::MultiHardlink => "04;36",
            Self::Socket => "01;35",
            Self::Fifo => "33",
            Self::BlockDev => "01;33",
            Self::CharDev => "01;33",
            Self::Regular => "0",
            Self::Unknown => "02;04;37",
            Self::Eln => "01;33",
            Self::SelMarker => "01;32",
            Self::Trim => "01;31",
            Self::Prompt => "0",
            Self::Warning => "01;31",
        }
    }

    const ALL: [ColorKey; 25] = [
        Self::BrokenLink,
        Self::LinkDir,
        Self::Link,
        Self::StickyOtherWritableDir,
        Self::OtherWritableDir,
        Self::StickyDir,
        Self::Dir,
        Self::EmptyDir,
        Self::Suid,
        Self::Sgid,
        Self::Capability,
        Self::Exec,
        Self::EmptyFile,
        Self::MultiHardlink,
        Self::Socket,
        Self::Fifo,
        Self::BlockDev,
        Self::CharDev,
        Self::Regular,
        Self::Unknown,
        Self::Eln,
        Self::SelMarker,
        Self::Trim,
        Self::Prompt,
        Self::Warning,
    ];
}

#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub name: String,
    /// Whether SGR sequences are emitted at all (`NO_COLOR`, `Colors=false`).
    pub enabled: bool,
    table: HashMap<ColorKey, String>,
    ext: HashMap<String, String>,
}

impl Default for ColorScheme {
    fn default() -> Self {
        let mut table = HashMap::new();
        for key in ColorKey::ALL {
            table.insert(key, key.default_sgr().to_string());
        }
        Self {
            name: "default".to_string(),
            enabled: true,
            table,
            ext: HashMap::new(),
        }
    }
}

impl ColorScheme {
    /// Load `colors/<name>.clifm`, overlaying the built-in defaults. A missing
    /// file yields the defaults under the requested name.
    pub fn load(colors_dir: &Path, name: &str, enabled: bool) -> Self {
        let mut scheme = Self {
            name: name.to_string(),
            enabled,
            ..Self::default()
        };
        let path = colors_dir.join(format!("{name}.clifm"));
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return scheme,
        };
        for raw in content.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                warn!(target: "config.colors", scheme = name, line, "expected KEY=SGR");
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if !value.bytes().all(|b| b.is_ascii_digit() || b == b';') {
                warn!(target: "config.colors", scheme = name, key, "invalid SGR value");
                continue;
            }
            if let Some(e) = key.strip_prefix("ext:") {
                scheme
                    .ext
                    .insert(e.trim_start_matches('.').to_ascii_lowercase(), value.to_string());
                continue;
            }
            match ColorKey::ALL.iter().find(|k| k.rc_name() == key) {
                Some(k) => {
                    scheme.table.insert(*k, value.to_string());
                }
                None => warn!(target: "config.colors", scheme = name, key, "unknown color key"),
            }
        }
        scheme
    }

    /// SGR parameters for a class. Entries hold the `ColorKey`, not the
    /// string, so the table can be swapped by `cs` without touching entries.
    pub fn sgr(&self, key: ColorKey) -> &str {
        self.table
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.default_sgr())
    }

    /// Full escape sequence for a class, empty when colors are disabled.
    pub fn seq(&self, key: ColorKey) -> String {
        if !self.enabled {
            return String::new();
        }
        format!("\x1b[{}m", self.sgr(key))
    }

    pub fn ext_sgr(&self, ext: &str) -> Option<&str> {
        self.ext.get(&ext.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn reset(&self) -> &'static str {
        if self.enabled { "\x1b[0m" } else { "" }
    }
}
