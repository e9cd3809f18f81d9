// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The `inFlight` table: every envelope a `Connection` has ever
//! issued, keyed by identifier, retained for the connection's lifetime so
//! selective resend can walk the dropped tail after a server rejection.
//!
//! Identifiers are assigned densely and strictly increasing from the first
//! one issued, so this is a `Vec` indexed by `identifier - base_identifier`
//! rather than a `HashMap`.

use crate::envelope::MessageEnvelope;

#[derive(Default)]
pub(crate) struct InFlightTable {
    base_identifier: Option<u32>,
    envelopes: Vec<MessageEnvelope>,
}

impl InFlightTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts an envelope. Identifiers must arrive in the strictly
    /// increasing, gapless order `Connection` issues them in.
    pub(crate) fn insert(&mut self, envelope: MessageEnvelope) {
        let identifier = envelope.identifier();
        let base = *self.base_identifier.get_or_insert(identifier);
        let index = (identifier - base) as usize;
        debug_assert_eq!(
            index,
            self.envelopes.len(),
            "envelopes must be inserted in identifier order with no gaps"
        );
        self.envelopes.push(envelope);
    }

    /// Total envelopes ever issued on this connection, including resolved
    /// ones — `inFlight` never shrinks.
    pub(crate) fn len(&self) -> usize {
        self.envelopes.len()
    }

    pub(crate) fn get(&self, identifier: u32) -> Option<&MessageEnvelope> {
        let index = self.index_of(identifier)?;
        self.envelopes.get(index)
    }

    pub(crate) fn get_mut(&mut self, identifier: u32) -> Option<&mut MessageEnvelope> {
        let index = self.index_of(identifier)?;
        self.envelopes.get_mut(index)
    }

    /// Identifiers from `start` up to (not including) the first one this
    /// table has never seen. There is never a gap to fill, so this is
    /// exactly the contiguous run from `start` to the end of the dense
    /// table.
    pub(crate) fn identifiers_from(&self, start: u32) -> impl Iterator<Item = u32> + '_ {
        let base = self.base_identifier;
        let range = match self.index_of(start) {
            Some(start_index) => start_index..self.envelopes.len(),
            None => 0..0,
        };
        range.map(move |index| base.unwrap() + index as u32)
    }

    fn index_of(&self, identifier: u32) -> Option<usize> {
        let base = self.base_identifier?;
        if identifier < base {
            return None;
        }
        let index = (identifier - base) as usize;
        if index < self.envelopes.len() {
            Some(index)
        } else {
            None
        }
    }
}
