//! # Compound Assembler
//!
//! Groups macros into compounds between BEGIN and END triggers.
//!
//! ## States
//!
//! - **Idle**: every macro is finalized as soon as it arrives
//! - **Grouping**: macros are collected into the open compound
//!
//! A BEGIN while grouping is ignored, so at most one compound is open. END
//! and CURSOR_CHANGE close the open compound whatever its label. A cancel
//! macro inside a group removes the edit it reverses instead of being added.

use tracing::{debug, warn};

use crate::macros::{CompoundMacro, DocumentMacro, Macro, TriggerKind};

/// What happened to a macro fed to the assembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembled {
    /// A macro, or a closed compound, is final
    Finalized(Macro),
    /// Opened a group, joined the open group, or was an ignored trigger
    Pending,
    /// Removed the child it reverses from the open group
    Cancelled,
    /// A cancel macro found nothing to reverse and was dropped
    Unresolved(DocumentMacro),
    /// A group closed with no children left
    Discarded,
}

#[derive(Debug, Default)]
pub struct CompoundAssembler {
    open: Option<CompoundMacro>,
}

impl CompoundAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_grouping(&self) -> bool {
        self.open.is_some()
    }

    /// Label of the open compound, if any
    pub fn open_label(&self) -> Option<&str> {
        self.open.as_ref().map(|c| c.label.as_str())
    }

    pub fn record(&mut self, m: Macro) -> Assembled {
        match m {
            Macro::Trigger(trigger) => match trigger.kind {
                TriggerKind::Begin => {
                    if self.open.is_none() {
                        debug!(label = %trigger.label, path = %trigger.path, "open compound");
                        self.open = Some(CompoundMacro::new(
                            trigger.time,
                            trigger.label,
                            trigger.path,
                        ));
                    }
                    Assembled::Pending
                }
                TriggerKind::End | TriggerKind::CursorChange => self.close(),
            },

            Macro::Cancel(cancel) => match self.open.as_mut() {
                Some(compound) => {
                    if compound.cancel(&cancel) {
                        Assembled::Cancelled
                    } else {
                        warn!(
                            path = %cancel.path,
                            offset = cancel.offset,
                            label = %compound.label,
                            "cancellation failed: no matching edit in open compound"
                        );
                        Assembled::Unresolved(cancel)
                    }
                }
                // Nothing to reverse inside; it is an ordinary undo or redo
                None => Assembled::Finalized(Macro::Document(cancel)),
            },

            other => match self.open.as_mut() {
                Some(compound) => {
                    compound.add(other);
                    Assembled::Pending
                }
                None => Assembled::Finalized(other),
            },
        }
    }

    /// Close the open compound, if any
    pub fn close(&mut self) -> Assembled {
        match self.open.take() {
            Some(mut compound) => {
                if compound.is_empty() {
                    debug!(label = %compound.label, "discard empty compound");
                    return Assembled::Discarded;
                }
                compound.set_times();
                Assembled::Finalized(Macro::Compound(compound))
            }
            None => Assembled::Pending,
        }
    }

    /// Drop any open compound without emitting it
    pub fn reset(&mut self) {
        self.open = None;
    }
}
