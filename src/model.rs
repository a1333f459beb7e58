//! Data Model: the top-level registry. Owns the store and dispatches
//! `add`/`get_range`/`flush` to the processor matching a reading's type.
//!
//! Rust has no runtime type registry for arbitrary structs, so
//! [`std::any::TypeId`] plus a small type-erasure trait ([`ErasedProcessor`])
//! fills that role: one `HashMap` holding heterogeneous `ReadingProcessor<T>`
//! instances behind trait objects, downcast back to the caller's concrete
//! `T` on every call.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use rusqlite::Connection;

use crate::config::{KeepRawReadings, StoreConfig};
use crate::error::{EngineError, EngineResult};
use crate::processor::ReadingProcessor;
use crate::reading::{Reading, ReadingSummary, SummaryFunction};
use crate::schema::ReadingPayload;
use crate::store::Store;

trait ErasedProcessor: Any {
    fn flush(&mut self, conn: &Connection) -> EngineResult<()>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: ReadingPayload> ErasedProcessor for ReadingProcessor<T> {
    fn flush(&mut self, conn: &Connection) -> EngineResult<()> {
        ReadingProcessor::flush(self, conn)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Top-level engine handle. One per database file.
pub struct DataModel {
    store: Store,
    keep_raw: KeepRawReadings,
    processors: HashMap<TypeId, Box<dyn ErasedProcessor>>,
}

impl DataModel {
    pub fn init(config: StoreConfig) -> EngineResult<Self> {
        let store = Store::open(&config.db_path, config.busy_timeout_ms)?;
        Ok(Self {
            store,
            keep_raw: config.keep_raw_readings,
            processors: HashMap::new(),
        })
    }

    pub fn init_in_memory() -> EngineResult<Self> {
        let store = Store::open_in_memory(StoreConfig::default().busy_timeout_ms)?;
        Ok(Self {
            store,
            keep_raw: KeepRawReadings::default(),
            processors: HashMap::new(),
        })
    }

    /// Registers `T`, building its raw table (if keep-raw mode was enabled
    /// at [`Self::init`]) and its five LOD tables. Rejects a type already
    /// registered — a reading type may be registered at most once.
    pub fn register_type<T: ReadingPayload>(
        &mut self,
        type_name: impl Into<String>,
        ignored_paths: &[&str],
        summary_fn: SummaryFunction<T>,
    ) -> EngineResult<()> {
        let type_id = TypeId::of::<T>();
        if self.processors.contains_key(&type_id) {
            return Err(EngineError::unsupported(format!(
                "type {} is already registered",
                std::any::type_name::<T>()
            )));
        }

        let processor = ReadingProcessor::<T>::register(
            self.store.connection(),
            type_name,
            self.keep_raw,
            ignored_paths,
            summary_fn,
        )?;
        self.processors.insert(type_id, Box::new(processor));
        Ok(())
    }

    fn processor<T: ReadingPayload>(&self) -> EngineResult<&ReadingProcessor<T>> {
        let type_id = TypeId::of::<T>();
        let erased = self.processors.get(&type_id).ok_or_else(|| {
            EngineError::type_mismatch(format!("type {} is not registered", std::any::type_name::<T>()))
        })?;
        erased
            .as_any()
            .downcast_ref::<ReadingProcessor<T>>()
            .ok_or_else(|| EngineError::logic("type id matched a processor of a different type"))
    }

    pub fn add<T: ReadingPayload>(&mut self, reading: Reading<T>) -> EngineResult<()> {
        let conn = self.store.connection();
        let type_id = TypeId::of::<T>();
        let erased = self.processors.get_mut(&type_id).ok_or_else(|| {
            EngineError::type_mismatch(format!("type {} is not registered", std::any::type_name::<T>()))
        })?;
        let processor = erased
            .as_any_mut()
            .downcast_mut::<ReadingProcessor<T>>()
            .ok_or_else(|| EngineError::logic("type id matched a processor of a different type"))?;
        processor.add(conn, reading)
    }

    pub fn get_range<T: ReadingPayload>(
        &self,
        start_millis: i64,
        end_millis: i64,
        n: usize,
    ) -> EngineResult<Vec<ReadingSummary<T>>> {
        let conn = self.store.connection();
        self.processor::<T>()?.get_range(conn, start_millis, end_millis, n)
    }

    /// Flushes every registered processor's currently-open seconds chunk.
    pub fn flush(&mut self) -> EngineResult<()> {
        for processor in self.processors.values_mut() {
            processor.flush(self.store.connection())?;
        }
        Ok(())
    }
}

impl Drop for DataModel {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            tracing::error!(error = %err, "final flush on drop failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{average_intensity, StressIntensity};

    fn registered_model() -> DataModel {
        let mut model = DataModel::init_in_memory().unwrap();
        model.register_type("stress_intensity", &[], average_intensity).unwrap();
        model
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut model = registered_model();
        let err = model
            .register_type::<StressIntensity>("stress_intensity_again", &[], average_intensity)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedSchema(_)));
    }

    #[test]
    fn add_to_unregistered_type_is_a_type_mismatch() {
        #[derive(Debug, Clone, Copy, Default)]
        struct Unregistered {}

        crate::derive_reading! {
            struct Unregistered {}
        }

        let mut model = DataModel::init_in_memory().unwrap();
        let err = model
            .add(Reading::new(TimeStamp::from_seconds(0), Unregistered))
            .unwrap_err();
        assert!(matches!(err, EngineError::TypeMismatch(_)));
    }

    #[test]
    fn round_trips_a_single_reading_through_the_public_api() {
        let mut model = registered_model();
        let ts = TimeStamp::from_seconds(42);
        model.add(Reading::new(ts, StressIntensity { value: 12.5 })).unwrap();
        model.flush().unwrap();

        let out: Vec<ReadingSummary<StressIntensity>> =
            model.get_range(ts.millis(), ts.millis() + 1, 1).unwrap();
        assert_eq!(out.len(), 1);
        assert!((out[0].value.value - 12.5).abs() < 1e-3);
        assert_eq!(out[0].num_seconds_active, 1);
    }

    #[test]
    fn law6_summaries_are_monotonic_in_timestamp() {
        let mut model = registered_model();
        for i in 0..200i64 {
            model
                .add(Reading::new(TimeStamp::from_seconds(i), StressIntensity { value: i as f32 }))
                .unwrap();
        }
        model.flush().unwrap();

        let out: Vec<ReadingSummary<StressIntensity>> = model.get_range(0, 200_000, 10).unwrap();
        for pair in out.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }
}
