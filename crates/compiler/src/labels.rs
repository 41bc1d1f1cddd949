// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use crate::errors::TranslateError;
use std::fmt;

/// Default capacity of the label id space.
pub const LABELS_MAX: u16 = 1000;

/// A branch target in emitted code, rendered `L{n}`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Label(pub u16);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Hands out labels in a monotonically increasing sequence. Labels are never
/// freed or reused; the id space is bounded and allocating past it is fatal,
/// not a wraparound.
#[derive(Debug)]
pub struct Labels {
    next: u16,
    limit: u16,
}

impl Labels {
    pub fn new() -> Self {
        Self::with_limit(LABELS_MAX)
    }

    pub fn with_limit(limit: u16) -> Self {
        Self { next: 0, limit }
    }

    pub fn next_label(&mut self) -> Result<Label, TranslateError> {
        if self.next >= self.limit {
            return Err(TranslateError::LabelsExhausted);
        }
        let label = Label(self.next);
        self.next += 1;
        Ok(label)
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self::new()
    }
}
