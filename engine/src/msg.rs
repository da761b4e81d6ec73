//! Message log the display layer reads from.

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Runtime-owned message buffer.
///
/// New messages land in the fresh list; the display collaborator shows
/// them and flushes them into the archive.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MessageLog {
    fresh: Vec<String>,
    archive: Vec<String>,
}

impl MessageLog {
    pub fn push(&mut self, text: impl Into<String>) {
        self.fresh.push(text.into());
    }

    /// Messages that haven't been shown yet.
    pub fn unread(&self) -> &[String] {
        &self.fresh
    }

    /// Move unread messages to the archive once shown.
    pub fn flush(&mut self) {
        self.archive.append(&mut self.fresh);
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.archive
            .iter()
            .chain(self.fresh.iter())
            .map(String::as_str)
    }
}

impl Runtime {
    /// Log a message the player always hears.
    pub(crate) fn say(&mut self, text: impl Into<String>) {
        self.msg.push(text);
    }

    /// Log a message tied to a map cell; dropped unless the player can
    /// currently see the cell.
    pub(crate) fn say_at(&mut self, pos: IVec2, text: impl Into<String>) {
        if self.player_fov.contains(pos) {
            self.msg.push(text);
        }
    }

    pub fn messages(&self) -> &MessageLog {
        &self.msg
    }

    pub fn messages_mut(&mut self) -> &mut MessageLog {
        &mut self.msg
    }
}
