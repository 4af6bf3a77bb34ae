//! Property-based test generators using proptest.
//!
//! Every strategy produces input that passes validation, so generated
//! batches exercise the queue rather than the validators.

use chrono::{NaiveDate, NaiveTime};
use proptest::prelude::*;
use vetsync_core::{AppointmentFields, PetFields};
use vetsync_sync_protocol::PetId;

/// Strategy for short required text, never blank.
pub fn short_text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z ]{0,23}").expect("Invalid regex")
}

/// Strategy for valid pet input.
pub fn pet_fields_strategy() -> impl Strategy<Value = PetFields> {
    (
        short_text_strategy(),
        prop_oneof![Just("dog"), Just("cat"), Just("bird"), Just("rabbit")],
        prop::option::of(short_text_strategy()),
        prop::option::of(
            prop::string::string_regex("[0-9]{1,2} (months|years)").expect("Invalid regex"),
        ),
        prop::option::of(prop::string::string_regex("[0-9]{1,2}kg").expect("Invalid regex")),
        prop::option::of(prop::string::string_regex(".{0,200}").expect("Invalid regex")),
    )
        .prop_map(|(name, species, breed, age, weight, notes)| PetFields {
            name,
            species: species.to_string(),
            breed,
            age,
            weight,
            notes,
        })
}

/// Strategy for a preferred date and time during clinic hours.
pub fn appointment_slot_strategy() -> impl Strategy<Value = (NaiveDate, NaiveTime)> {
    (1u32..=12, 1u32..=28, 8u32..18, prop_oneof![Just(0u32), Just(30u32)]).prop_map(
        |(month, day, hour, minute)| {
            (
                NaiveDate::from_ymd_opt(2026, month, day).expect("valid date"),
                NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time"),
            )
        },
    )
}

/// Strategy for valid appointment input for `pet`.
pub fn appointment_fields_strategy(pet: PetId) -> impl Strategy<Value = AppointmentFields> {
    (
        appointment_slot_strategy(),
        short_text_strategy(),
        prop::option::of(short_text_strategy()),
    )
        .prop_map(move |((date, time), reason, notes)| AppointmentFields {
            pet_id: pet,
            preferred_date: date,
            preferred_time: time,
            reason,
            notes,
        })
}

/// One user action taken while offline.
#[derive(Debug, Clone)]
pub enum OfflineAction {
    /// Register a pet.
    CreatePet(PetFields),
    /// Request an appointment for an earlier pet of the batch.
    ///
    /// `pet_index` is taken modulo the pets created so far; the action is
    /// skipped if there are none.
    CreateAppointment {
        /// Which earlier pet to book for.
        pet_index: usize,
        /// Requested day.
        date: NaiveDate,
        /// Requested time.
        time: NaiveTime,
        /// Reason for the visit.
        reason: String,
    },
}

/// Strategy for a single offline action.
pub fn offline_action_strategy() -> impl Strategy<Value = OfflineAction> {
    prop_oneof![
        2 => pet_fields_strategy().prop_map(OfflineAction::CreatePet),
        3 => (any::<usize>(), appointment_slot_strategy(), short_text_strategy()).prop_map(
            |(pet_index, (date, time), reason)| OfflineAction::CreateAppointment {
                pet_index,
                date,
                time,
                reason,
            }
        ),
    ]
}

/// Strategy for a batch of offline actions.
pub fn offline_batch_strategy(
    min_actions: usize,
    max_actions: usize,
) -> impl Strategy<Value = Vec<OfflineAction>> {
    prop::collection::vec(offline_action_strategy(), min_actions..max_actions)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 128,
            max_shrink_iters: 500,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 24,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
