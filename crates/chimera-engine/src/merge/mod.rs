//! Descriptor Merge
//!
//! Copies the members declared across a user hierarchy onto a fused
//! instance, in two passes:
//!
//! 1. **Collect**: walk the user levels from the most basal ancestor to the
//!    most derived type. Every own key is classified into a
//!    [`PropertyRecord`] and merged into the running record for that key
//!    under the active [`StrictnessPolicy`]. Reserved keys and keys native
//!    to the instance's host tag are never collected. Functions are bound to
//!    the instance as they are collected.
//! 2. **Commit**: define every record on the instance, configurable exactly
//!    when the record is not lockable. A refused definition is reported and
//!    skipped; the pass never fails.

mod record;

pub use record::{resolve, PropertyRecord, RecordKind, Resolution};

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use tracing::debug;

use crate::diagnostics::DiagnosticCode;
use crate::kernel::Kernel;
use crate::policy::StrictnessPolicy;
use crate::realm::{ObjectId, PropertyKey, Realm, Target, TypeId, Value};

/// Keys that are never merged onto an instance
#[derive(Debug, Clone)]
pub struct ReservedKeys {
    names: FxHashSet<String>,
}

impl Default for ReservedKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservedKeys {
    /// Names reserved in every configuration
    pub const BUILTIN: [&'static str; 2] = ["constructor", "prototype"];

    /// The built-in reserved names
    pub fn new() -> Self {
        Self {
            names: Self::BUILTIN.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Built-in names plus `extra`
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys = Self::new();
        keys.names.extend(extra.into_iter().map(Into::into));
        keys
    }

    /// Reserve one more name
    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }

    /// Check if a key is reserved. Engine-internal symbols always are.
    pub fn contains(&self, key: &PropertyKey) -> bool {
        match key {
            PropertyKey::String(name) => self.names.contains(name),
            PropertyKey::Symbol(id) => id.is_internal(),
        }
    }
}

/// What a merge did, key by key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Keys defined on the instance
    pub defined: Vec<PropertyKey>,
    /// Keys left alone because the host tag owns them
    pub skipped_native: Vec<PropertyKey>,
    /// Keys whose override was dropped in favor of an ancestor's definition
    pub rejected: Vec<PropertyKey>,
    /// Keys the instance refused to accept
    pub failed: Vec<PropertyKey>,
}

impl MergeReport {
    /// Check if every collected record was committed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

type RecordMap = IndexMap<PropertyKey, PropertyRecord, FxBuildHasher>;

/// Two-pass descriptor merge
#[derive(Debug, Clone)]
pub struct DescriptorMerge {
    kernel: Kernel,
    reserved: ReservedKeys,
}

impl DescriptorMerge {
    /// Create a merge reflecting through `kernel`
    pub fn new(kernel: Kernel, reserved: ReservedKeys) -> Self {
        Self { kernel, reserved }
    }

    /// Reserved keys
    pub fn reserved(&self) -> &ReservedKeys {
        &self.reserved
    }

    /// Merge `user`'s hierarchy onto `instance` and commit the result
    pub fn run(
        &self,
        realm: &mut Realm,
        instance: ObjectId,
        user: TypeId,
        policy: StrictnessPolicy,
    ) -> MergeReport {
        let mut report = MergeReport::default();
        let records = self.collect(realm, instance, user, policy, &mut report);
        self.commit(realm, instance, records, &mut report);
        report
    }

    /// Pass 1: build the final record of every mergeable key, in the order
    /// keys were first declared
    pub fn collect(
        &self,
        realm: &mut Realm,
        instance: ObjectId,
        user: TypeId,
        policy: StrictnessPolicy,
        report: &mut MergeReport,
    ) -> Vec<PropertyRecord> {
        let receiver = Value::Object(instance);
        let mut records = RecordMap::default();
        let mut native: FxHashMap<PropertyKey, bool> = FxHashMap::default();

        let levels = self.kernel.user_levels(realm, user);
        for &level in levels.iter().rev() {
            for key in self.kernel.own_keys(realm, Target::Type(level)) {
                if self.reserved.contains(&key) {
                    continue;
                }
                let is_native = match native.get(&key) {
                    Some(&known) => known,
                    None => {
                        let probed = self.kernel.is_host_own_property(realm, instance, &key);
                        native.insert(key.clone(), probed);
                        if probed {
                            report.skipped_native.push(key.clone());
                        }
                        probed
                    }
                };
                if is_native {
                    continue;
                }
                let Some(descriptor) = self.kernel.own_property(realm, Target::Type(level), &key) else {
                    continue;
                };

                let incoming = PropertyRecord::from_descriptor(key.clone(), descriptor.bound_to(&receiver), level);
                let Some(current) = records.get(&key) else {
                    records.insert(key, incoming);
                    continue;
                };
                let (merged, resolution) = resolve(policy, current, incoming);
                match resolution {
                    Resolution::Accepted => {}
                    Resolution::KindChanged => self.kernel.report(
                        DiagnosticCode::KindChanged,
                        format!("'{key}' changes kind at {level}"),
                    ),
                    Resolution::Rejected => {
                        self.kernel.report(
                            DiagnosticCode::MergeRejected,
                            format!("override of locked '{key}' at {level} rejected under {policy}"),
                        );
                        report.rejected.push(key.clone());
                    }
                }
                records.insert(key, merged);
            }
        }

        records.into_values().collect()
    }

    /// Pass 2: define every record on the instance
    pub fn commit(
        &self,
        realm: &mut Realm,
        instance: ObjectId,
        records: Vec<PropertyRecord>,
        report: &mut MergeReport,
    ) {
        for record in records {
            let descriptor = record.to_descriptor();
            if self.kernel.define_property(realm, instance, record.key.clone(), descriptor) {
                report.defined.push(record.key);
            } else {
                self.kernel.report(
                    DiagnosticCode::DefineFailed,
                    format!("'{}' could not be defined on {instance}", record.key),
                );
                report.failed.push(record.key);
            }
        }
        debug!(
            instance = %instance,
            defined = report.defined.len(),
            failed = report.failed.len(),
            "descriptor merge committed"
        );
    }
}
