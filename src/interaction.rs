// Copyright 2025 Tracelight Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Incremental event accumulation.
//!
//! An [`Interaction`] is a single-use builder: opened with the user input,
//! enriched with attachments while the interaction is in flight, then
//! finished with the output, at which point it emits exactly one event
//! record through the owning client and seals itself.

use crate::client::TrackingClient;
use crate::error::{Result, TracelightError};
use crate::types::{Attachment, EventRecord};

/// In-progress event accumulator. Sealed after `finish`.
pub struct Interaction<'a> {
    client: &'a TrackingClient,
    id: String,
    user_id: String,
    event: String,
    input: String,
    attachments: Vec<Attachment>,
    finished: bool,
}

impl<'a> Interaction<'a> {
    pub(crate) fn new(
        client: &'a TrackingClient,
        id: String,
        user_id: String,
        event: String,
        input: String,
    ) -> Self {
        Self {
            client,
            id,
            user_id,
            event,
            input,
            attachments: Vec::new(),
            finished: false,
        }
    }

    /// Identifier assigned at open time; becomes the event id on finish.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append attachments in order. Fails once the interaction is finished.
    pub fn add_attachments(&mut self, attachments: Vec<Attachment>) -> Result<()> {
        if self.finished {
            return Err(TracelightError::SealedInteraction(self.id.clone()));
        }
        self.attachments.extend(attachments);
        Ok(())
    }

    /// Merge trailing attachments, emit one event record, and seal the
    /// interaction. A second call fails with `SealedInteraction` and leaves
    /// the already-emitted record untouched.
    pub fn finish(
        &mut self,
        output: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> Result<String> {
        if self.finished {
            return Err(TracelightError::SealedInteraction(self.id.clone()));
        }

        let mut merged = std::mem::take(&mut self.attachments);
        merged.extend(attachments);

        let mut event = EventRecord::new(self.user_id.clone(), self.event.clone())
            .with_event_id(self.id.clone())
            .with_input(self.input.clone())
            .with_output(output);
        event.attachments = merged;

        let event_id = self.client.track_event(event)?;
        self.finished = true;
        Ok(event_id)
    }
}
