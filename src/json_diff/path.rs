// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

const POINTER_PATTERN: &str = r"^(/([^~/]|~[01])*)*$";

/// Location of a node inside a JSON document.
///
/// Paths are immutable. [`Path::append`] shares the parent instead of
/// copying it, so building the path of every visited node costs one
/// allocation per level.
#[derive(Clone, Default)]
pub struct Path(Option<Arc<Link>>);

struct Link {
    parent: Path,
    key: Key,
}

/// One segment of a [`Path`].
#[derive(Debug, Clone)]
pub enum Key {
    Field(String),
    Idx(usize),
}

#[derive(Debug, Error)]
pub enum PathError {
    #[error("invalid JSON pointer {pointer:?}: `~` must be followed by `0` or `1`")]
    InvalidEscape { pointer: String },
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

// Mirrors `str::parse` but keeps rule definitions readable in call chains.
pub trait JsonPointer {
    fn pointer(&self) -> Result<Path, PathError>;
}

impl JsonPointer for str {
    fn pointer(&self) -> Result<Path, PathError> {
        Path::from_pointer(self)
    }
}

impl Key {
    /// Unescaped textual form of the segment.
    pub fn segment(&self) -> Cow<'_, str> {
        match self {
            Key::Field(field) => Cow::Borrowed(field),
            Key::Idx(idx) => Cow::Owned(idx.to_string()),
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Idx(idx) => Some(*idx),
            Key::Field(_) => None,
        }
    }

    fn parse(segment: &str) -> Key {
        let is_index = !segment.is_empty()
            && segment.bytes().all(|b| b.is_ascii_digit())
            && (segment == "0" || !segment.starts_with('0'));

        match segment.parse::<usize>() {
            Ok(idx) if is_index => Key::Idx(idx),
            _ => Key::Field(segment.to_string()),
        }
    }
}

// A field named "3" and index 3 address the same node in a pointer, so rule
// lookups must treat them alike.
impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Field(a), Key::Field(b)) => a == b,
            (Key::Idx(a), Key::Idx(b)) => a == b,
            _ => self.segment() == other.segment(),
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segment().hash(state);
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Key::Idx(idx) => write!(f, "{}", idx),
            Key::Field(field) => write!(f, "{}", escape(field)),
        }
    }
}

impl Path {
    pub fn root() -> Self {
        Path(None)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_none()
    }

    pub fn append(&self, next: Key) -> Path {
        Path(Some(Arc::new(Link {
            parent: self.clone(),
            key: next,
        })))
    }

    /// Keys from the root down to this node.
    pub fn keys(&self) -> Vec<&Key> {
        let mut keys = vec![];
        let mut current = self;
        while let Some(link) = &current.0 {
            keys.push(&link.key);
            current = &link.parent;
        }
        keys.reverse();
        keys
    }

    pub fn split_last(&self) -> Option<(&Path, &Key)> {
        self.0.as_ref().map(|link| (&link.parent, &link.key))
    }

    /// True when the path reaches an object member without crossing an array.
    pub(crate) fn is_member_path(&self) -> bool {
        !self.is_root() && self.keys().iter().all(|key| matches!(key, Key::Field(_)))
    }

    /// The same path with its leading `from` replaced by `to`. Paths that do
    /// not start with `from` come back unchanged.
    pub(crate) fn rebase(&self, from: &Path, to: &Path) -> Path {
        if self == from {
            return to.clone();
        }
        match self.split_last() {
            Some((parent, key)) => {
                let rebased = parent.rebase(from, to);
                if rebased == *parent {
                    self.clone()
                } else {
                    rebased.append(key.clone())
                }
            }
            None => self.clone(),
        }
    }

    /// Parses an RFC 6901 JSON pointer.
    ///
    /// The leading `/` may be omitted, so `id` and `/id` are the same path.
    /// The empty string is the root.
    pub fn from_pointer(pointer: &str) -> Result<Path, PathError> {
        if pointer.is_empty() {
            return Ok(Path::root());
        }

        let absolute = if pointer.starts_with('/') {
            Cow::Borrowed(pointer)
        } else {
            Cow::Owned(format!("/{}", pointer))
        };

        if !pointer_regex()?.is_match(&absolute) {
            return Err(PathError::InvalidEscape {
                pointer: pointer.to_string(),
            });
        }

        Ok(absolute
            .split('/')
            .skip(1)
            .map(|segment| Key::parse(&unescape(segment)))
            .fold(Path::root(), |path, key| path.append(key)))
    }
}

fn pointer_regex() -> Result<&'static Regex, PathError> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(POINTER_PATTERN))
        .as_ref()
        .map_err(|e| PathError::Pattern(e.clone()))
}

fn escape(segment: &str) -> Cow<'_, str> {
    if !segment.contains('~') && !segment.contains('/') {
        return Cow::Borrowed(segment);
    }
    Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
}

fn unescape(segment: &str) -> Cow<'_, str> {
    if !segment.contains('~') {
        return Cow::Borrowed(segment);
    }
    // ~1 first, otherwise "~01" would turn into "/"
    Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b) || (a.key == b.key && a.parent == b.parent),
            _ => false,
        }
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for key in self.keys() {
            key.hash(state);
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for key in self.keys() {
            write!(f, "/{}", key)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Path({:?})", self.to_string())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
