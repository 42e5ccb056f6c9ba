//! Rotation-chain bookkeeping.
//!
//! Documents are immutable; a rotation creates a successor whose
//! `keyHistory` is the predecessor's history plus its `currentCore`.
//! [`RotationLog`] tracks the committed head for one identifier and rejects
//! successors that do not extend it. [`RotationRegistry`] serializes
//! rotations per identifier while different identifiers proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::document::IdentityDocument;
use crate::error::{DidError, Result};

/// Append-only head of one identifier's rotation chain.
#[derive(Debug, Clone)]
pub struct RotationLog {
    did: String,
    history: Vec<String>,
    current: Option<String>,
}

impl RotationLog {
    /// An empty log: the next document is sequence 1.
    pub fn new(did: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            history: Vec::new(),
            current: None,
        }
    }

    /// Start from an existing document as the committed head.
    pub fn from_document(doc: &IdentityDocument) -> Self {
        Self {
            did: doc.id.clone(),
            history: doc.key_history.clone(),
            current: Some(doc.current_core.clone()),
        }
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    /// Sequence of the committed head, 0 when nothing is committed.
    pub fn sequence(&self) -> u64 {
        match self.current {
            Some(_) => self.history.len() as u64 + 1,
            None => 0,
        }
    }

    /// CID of the committed head.
    pub fn head(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The prior history the next document must carry.
    pub fn next_prior_history(&self) -> Vec<String> {
        let mut prior = self.history.clone();
        if let Some(current) = &self.current {
            prior.push(current.clone());
        }
        prior
    }

    /// Advance the head to `doc`, if it directly extends the current head.
    pub fn commit(&mut self, doc: &IdentityDocument) -> Result<()> {
        if doc.id != self.did {
            return Err(DidError::structural(format!(
                "document {} does not belong to {}",
                doc.id, self.did
            )));
        }
        let expected_sequence = self.sequence() + 1;
        if doc.sequence != expected_sequence {
            return Err(DidError::structural(format!(
                "document sequence {} does not extend committed sequence {}",
                doc.sequence,
                self.sequence()
            )));
        }
        if doc.prev.as_deref() != self.head() {
            return Err(DidError::structural(format!(
                "document prev {:?} does not extend committed head {:?}",
                doc.prev,
                self.head()
            )));
        }
        if doc.key_history != self.next_prior_history() {
            return Err(DidError::structural(
                "document keyHistory does not extend the committed history",
            ));
        }

        log::debug!(
            "{} rotated to sequence {} ({})",
            self.did,
            doc.sequence,
            doc.current_core
        );
        if let Some(previous) = self.current.replace(doc.current_core.clone()) {
            self.history.push(previous);
        }
        Ok(())
    }
}

/// Per-identifier serialization of rotations.
#[derive(Debug, Default)]
pub struct RotationRegistry {
    logs: Mutex<HashMap<String, Arc<Mutex<RotationLog>>>>,
}

impl RotationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn log_for(&self, did: &str) -> Result<Arc<Mutex<RotationLog>>> {
        let mut logs = self
            .logs
            .lock()
            .map_err(|_| DidError::structural("rotation registry lock poisoned"))?;
        Ok(logs
            .entry(did.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(RotationLog::new(did))))
            .clone())
    }

    /// Run one rotation for `did`.
    ///
    /// `build` receives the prior history and returns the new document,
    /// which is committed before the per-identifier lock is released. Only
    /// one rotation per identifier is in flight at a time.
    pub fn rotate<F>(&self, did: &str, build: F) -> Result<IdentityDocument>
    where
        F: FnOnce(&[String]) -> Result<IdentityDocument>,
    {
        let log = self.log_for(did)?;
        let mut log = log
            .lock()
            .map_err(|_| DidError::structural(format!("rotation log for {did} poisoned")))?;
        let prior = log.next_prior_history();
        let doc = build(&prior)?;
        log.commit(&doc)?;
        Ok(doc)
    }

    /// Committed sequence for `did`, 0 if none.
    pub fn sequence(&self, did: &str) -> Result<u64> {
        let log = self.log_for(did)?;
        let log = log
            .lock()
            .map_err(|_| DidError::structural(format!("rotation log for {did} poisoned")))?;
        Ok(log.sequence())
    }

    /// Committed head CID for `did`.
    pub fn head(&self, did: &str) -> Result<Option<String>> {
        let log = self.log_for(did)?;
        let log = log
            .lock()
            .map_err(|_| DidError::structural(format!("rotation log for {did} poisoned")))?;
        Ok(log.head().map(str::to_string))
    }
}

/// Check that documents (oldest first) form one unbroken rotation chain.
///
/// The first document may start mid-chain.
pub fn verify_rotation_chain(chain: &[IdentityDocument]) -> Result<()> {
    for (i, pair) in chain.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        let at = i + 1;
        if next.id != prev.id {
            return Err(DidError::structural(format!(
                "document {at} belongs to {} instead of {}",
                next.id, prev.id
            )));
        }
        if prev.sequence.checked_add(1) != Some(next.sequence) {
            return Err(DidError::structural(format!(
                "document {at} has sequence {} after {}",
                next.sequence, prev.sequence
            )));
        }
        if next.prev.as_deref() != Some(prev.current_core.as_str()) {
            return Err(DidError::structural(format!(
                "document {at} prev does not reference the preceding currentCore"
            )));
        }
        if next.key_history != prev.successor_history() {
            return Err(DidError::structural(format!(
                "document {at} keyHistory does not extend the preceding history"
            )));
        }
    }
    Ok(())
}
