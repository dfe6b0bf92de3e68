use xxhash_rust::xxh3::xxh3_64;

/// Where a tracked file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Loaded from storage; `original` holds what was on disk at load time.
    Existing,
    /// Did not exist before this session; diffed against empty content.
    Created,
}

/// One tracked file inside a [`Session`](crate::Session).
///
/// Edits replace `current` wholesale. `original` is never touched after the
/// source is created, so a diff always spans load time to now. A pending
/// move changes `path` and remembers where the file lives in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    path: String,
    moved_from: Option<String>,
    origin: Origin,
    original: String,
    current: String,
}

impl Source {
    pub(crate) fn existing(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            path: path.into(),
            moved_from: None,
            origin: Origin::Existing,
            original: content.clone(),
            current: content,
        }
    }

    pub(crate) fn created(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            moved_from: None,
            origin: Origin::Created,
            original: String::new(),
            current: content.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Storage path of an Existing source with a pending move.
    pub fn moved_from(&self) -> Option<&str> {
        self.moved_from.as_deref()
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub(crate) fn set_current(&mut self, content: impl Into<String>) {
        self.current = content.into();
    }

    /// Point this source at `to`. Moving back to the storage path clears
    /// the pending move.
    pub(crate) fn relocate(&mut self, to: impl Into<String>) {
        let from = std::mem::replace(&mut self.path, to.into());
        if self.origin == Origin::Existing && self.moved_from.is_none() {
            self.moved_from = Some(from);
        }
        if self.moved_from.as_deref() == Some(self.path.as_str()) {
            self.moved_from = None;
        }
    }

    /// Where this source lives in storage before commit, if anywhere.
    pub fn storage_path(&self) -> Option<&str> {
        match self.origin {
            Origin::Existing => Some(self.moved_from().unwrap_or(&self.path)),
            Origin::Created => None,
        }
    }

    /// True when this source has to be written at commit time.
    pub fn is_changed(&self) -> bool {
        self.origin == Origin::Created || self.current != self.original
    }

    /// Fingerprint of the content this source was loaded with.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_text(&self.original)
    }
}

/// Check that storage still holds what a source was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fingerprint {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (cheaper to hold for large files)
    Hash(u64),
}

impl Fingerprint {
    /// Create a fingerprint from text, using a hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            Fingerprint::Hash(xxh3_64(text.as_bytes()))
        } else {
            Fingerprint::ExactMatch(text.to_string())
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            Fingerprint::ExactMatch(expected) => text == expected,
            Fingerprint::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }
}
