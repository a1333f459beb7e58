//! Reading Processor: the per-type ingest and query engine. Owns one raw
//! table (optional), five LOD tables, and the current-chunk index per tier.
//!
//! `add` pushes a reading into the currently open Seconds chunk (forcing any
//! earlier chunk closed first); `flush` force-closes whatever chunk is still
//! open without waiting for the next reading; `get_range` answers a
//! `(start, end, n)` query by walking the tier pyramid for each sub-interval,
//! using [`crate::tier::ChunkTransition`] to classify a reading's chunk
//! index against what's currently open instead of inline integer tests.

use rusqlite::Connection;

use crate::config::KeepRawReadings;
use crate::error::{EngineError, EngineResult};
use crate::reading::{Reading, ReadingSummary, SummaryFunction, WeightedObject};
use crate::schema::{compile_columns, ReadingPayload};
use crate::table::TableHandle;
use crate::timestamp::TimeStamp;
use crate::tier::{ChunkTransition, RawReadingCache, TierState, TIERS};

fn floor_to_multiple(x: i64, d: i64) -> i64 {
    x.div_euclid(d) * d
}

fn ceil_to_multiple(x: i64, d: i64) -> i64 {
    let floor = floor_to_multiple(x, d);
    if floor == x {
        floor
    } else {
        floor + d
    }
}

pub struct ReadingProcessor<T: ReadingPayload> {
    type_name: String,
    keep_raw: KeepRawReadings,
    raw_table: Option<TableHandle>,
    tier_tables: Vec<TableHandle>,
    tier_states: Vec<TierState>,
    raw_cache: RawReadingCache<T>,
    last_reading_time: TimeStamp,
    summary_fn: SummaryFunction<T>,
}

impl<T: ReadingPayload> ReadingProcessor<T> {
    pub fn register(
        conn: &Connection,
        type_name: impl Into<String>,
        keep_raw: KeepRawReadings,
        ignored_paths: &[&str],
        summary_fn: SummaryFunction<T>,
    ) -> EngineResult<Self> {
        let type_name = type_name.into();
        let columns = compile_columns(&T::leaves(), ignored_paths)?;

        let raw_table = match keep_raw {
            KeepRawReadings::Enabled => {
                let table = TableHandle::new(&type_name, None, columns.clone());
                table.create(conn)?;
                table.create_timestamp_index(conn)?;
                Some(table)
            }
            KeepRawReadings::Disabled => None,
        };

        let mut tier_tables = Vec::with_capacity(TIERS.len());
        for spec in TIERS.iter() {
            let table = TableHandle::new(&type_name, Some(spec.table_suffix), columns.clone());
            table.create(conn)?;
            table.create_timestamp_index(conn)?;
            tier_tables.push(table);
        }

        Ok(Self {
            type_name,
            keep_raw,
            raw_table,
            tier_tables,
            tier_states: vec![TierState::new(); TIERS.len()],
            raw_cache: Vec::new(),
            last_reading_time: TimeStamp::UNSET,
            summary_fn,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn add(&mut self, conn: &Connection, reading: Reading<T>) -> EngineResult<()> {
        self.flush_at(conn, reading.timestamp)?;

        if let Some(raw_table) = &self.raw_table {
            let mut cells = Vec::new();
            reading.value.bind_leaves(&mut cells);
            raw_table.insert(conn, reading.timestamp.millis(), 1, &cells)?;
        }

        self.raw_cache.push(ReadingSummary::new(reading.timestamp, 1, reading.value));
        self.last_reading_time = reading.timestamp;
        Ok(())
    }

    /// Forces the seconds-tier chunk covering the last-seen second to close,
    /// without requiring another reading to arrive.
    pub fn flush(&mut self, conn: &Connection) -> EngineResult<()> {
        if self.last_reading_time.is_set() {
            let t = self.last_reading_time.plus_millis(1_000);
            self.flush_at(conn, t)?;
        }
        Ok(())
    }

    fn flush_at(&mut self, conn: &Connection, t: TimeStamp) -> EngineResult<()> {
        let t_sec = t.seconds();

        for tier_index in 0..TIERS.len() {
            let spec = TIERS[tier_index];
            let chunk_index = TierState::chunk_index(spec.seconds_per_chunk, t_sec);

            match self.tier_states[tier_index].classify(chunk_index) {
                ChunkTransition::Open => break,
                ChunkTransition::Stale => {
                    tracing::warn!(
                        type_name = %self.type_name,
                        tier = ?spec.tier,
                        "dropped out-of-order reading at tier"
                    );
                    break;
                }
                ChunkTransition::Closed { previous } => {
                    if let Some(previous_chunk_index) = previous {
                        self.close_chunk(conn, tier_index, previous_chunk_index)?;
                    }
                    self.tier_states[tier_index].advance(chunk_index);
                }
            }
        }

        Ok(())
    }

    fn close_chunk(
        &mut self,
        conn: &Connection,
        tier_index: usize,
        previous_chunk_index: i64,
    ) -> EngineResult<()> {
        let spec = TIERS[tier_index];
        let previous_start_sec = previous_chunk_index * spec.seconds_per_chunk;
        let previous_start_millis = previous_start_sec * 1_000;

        let inputs: Vec<WeightedObject<T>> = if tier_index == 0 {
            let cache = std::mem::take(&mut self.raw_cache);
            if cache.is_empty() {
                return Err(EngineError::logic(
                    "seconds tier closed with an empty raw cache",
                ));
            }
            let weight = 1.0 / cache.len() as f32;
            cache.into_iter().map(|summary| WeightedObject::new(summary, weight)).collect()
        } else {
            let finer = &self.tier_tables[tier_index - 1];
            let rows = finer.query_from(conn, previous_start_millis)?;
            if rows.is_empty() {
                return Err(EngineError::logic(
                    "coarser tier closed with no rows from its finer tier",
                ));
            }
            let weight = 1.0 / rows.len() as f32;
            let mut out = Vec::with_capacity(rows.len());
            for row in rows {
                let payload = T::from_cells(&row.cells)?;
                let summary = ReadingSummary::new(
                    TimeStamp(row.timestamp_millis),
                    row.num_seconds_active,
                    payload,
                );
                out.push(WeightedObject::new(summary, weight));
            }
            out
        };

        let total_active: u32 = inputs.iter().map(|w| w.summary.num_seconds_active).sum();
        let payload = (self.summary_fn)(&inputs);
        let timestamp = TimeStamp::from_seconds(previous_start_sec);

        tracing::debug!(
            type_name = %self.type_name,
            tier = ?spec.tier,
            chunk_index = previous_chunk_index,
            total_active,
            "closed chunk"
        );

        let mut cells = Vec::new();
        payload.bind_leaves(&mut cells);
        self.tier_tables[tier_index].insert(conn, timestamp.millis(), total_active, &cells)?;
        Ok(())
    }

    /// `get_range`: splits `[start_millis, end_millis)` into `n` equal
    /// sub-intervals and answers each with [`Self::get_sub_range`].
    pub fn get_range(
        &self,
        conn: &Connection,
        start_millis: i64,
        end_millis: i64,
        n: usize,
    ) -> EngineResult<Vec<ReadingSummary<T>>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let width = (end_millis - start_millis) as f64 / n as f64;
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let s = (start_millis as f64 + i as f64 * width).round() as i64;
            let e = (start_millis as f64 + (i + 1) as f64 * width).round() as i64;
            // A sub-interval's millisecond bounds can straddle a single
            // second without either bound crossing its boundary (e.g.
            // [T, T+1ms)); ceiling the upper bound to whole seconds keeps
            // that second in range instead of collapsing to an empty one.
            let s_sec = s.div_euclid(1_000);
            let e_sec = ceil_to_multiple(e, 1_000).div_euclid(1_000);
            out.push(self.get_sub_range(conn, s_sec, e_sec)?);
        }
        Ok(out)
    }

    /// Two-phase tier walk answering one sub-interval `[s_sec, e_sec)`.
    fn get_sub_range(&self, conn: &Connection, s_sec: i64, e_sec: i64) -> EngineResult<ReadingSummary<T>> {
        let mut pieces: Vec<ReadingSummary<T>> = Vec::new();
        let mut cur = s_sec;
        let mut stopped_at = TIERS.len() - 1;

        for tier_index in 0..TIERS.len() {
            if tier_index < TIERS.len() - 1 {
                let d = TIERS[tier_index + 1].seconds_per_chunk;
                let next_lod_start = ceil_to_multiple(cur, d);
                let next_lod_end = next_lod_start + d;
                if next_lod_end < e_sec {
                    self.collect(conn, tier_index, cur, next_lod_start, &mut pieces)?;
                    cur = next_lod_start;
                    continue;
                }
            }

            let end_floor = floor_to_multiple(e_sec, TIERS[tier_index].seconds_per_chunk);
            self.collect(conn, tier_index, cur, end_floor, &mut pieces)?;
            cur = end_floor;
            stopped_at = tier_index;
            break;
        }

        for tier_index in (0..stopped_at).rev() {
            let end_floor = floor_to_multiple(e_sec, TIERS[tier_index].seconds_per_chunk);
            self.collect(conn, tier_index, cur, end_floor, &mut pieces)?;
            cur = end_floor;
        }

        let total_active: u32 = pieces.iter().map(|p| p.num_seconds_active).sum();
        let timestamp = TimeStamp::from_seconds(s_sec);

        if total_active == 0 {
            return Ok(ReadingSummary::new(timestamp, 0, T::default_payload()));
        }

        let weighted: Vec<WeightedObject<T>> = pieces
            .into_iter()
            .map(|summary| {
                let weight = summary.num_seconds_active as f32 / total_active as f32;
                WeightedObject::new(summary, weight)
            })
            .collect();
        let payload = (self.summary_fn)(&weighted);
        Ok(ReadingSummary::new(timestamp, total_active, payload))
    }

    fn collect(
        &self,
        conn: &Connection,
        tier_index: usize,
        a_sec: i64,
        b_sec: i64,
        out: &mut Vec<ReadingSummary<T>>,
    ) -> EngineResult<()> {
        if b_sec <= a_sec {
            return Ok(());
        }
        let rows = self.tier_tables[tier_index].query_range(conn, a_sec * 1_000, b_sec * 1_000)?;
        for row in rows {
            let payload = T::from_cells(&row.cells)?;
            out.push(ReadingSummary::new(
                TimeStamp(row.timestamp_millis),
                row.num_seconds_active,
                payload,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{average_intensity, StressIntensity};
    use crate::store::Store;

    fn new_processor() -> (Store, ReadingProcessor<StressIntensity>) {
        let store = Store::open_in_memory(5_000).unwrap();
        let processor = ReadingProcessor::register(
            store.connection(),
            "stress_intensity",
            KeepRawReadings::Disabled,
            &[],
            average_intensity,
        )
        .unwrap();
        (store, processor)
    }

    fn add_one_per_second(
        store: &Store,
        processor: &mut ReadingProcessor<StressIntensity>,
        start_sec: i64,
        values: impl Iterator<Item = f32>,
    ) {
        for (i, value) in values.enumerate() {
            let ts = TimeStamp::from_seconds(start_sec + i as i64);
            processor
                .add(store.connection(), Reading::new(ts, StressIntensity { value }))
                .unwrap();
        }
    }

    #[test]
    fn s1_single_reading() {
        let (store, mut processor) = new_processor();
        let t0 = TimeStamp::from_seconds(1_000);
        processor.add(store.connection(), Reading::new(t0, StressIntensity { value: 50.0 })).unwrap();
        processor.flush(store.connection()).unwrap();

        let out = processor.get_range(store.connection(), t0.millis(), t0.millis() + 1, 1).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].num_seconds_active, 1);
        assert!((out[0].value.value - 50.0).abs() < 1e-3);
    }

    #[test]
    fn s2_aligned_minute() {
        let (store, mut processor) = new_processor();
        let t0_sec = 0i64;
        add_one_per_second(&store, &mut processor, t0_sec, (0..60).map(|i| i as f32));
        processor.flush(store.connection()).unwrap();

        let start = TimeStamp::from_seconds(t0_sec).millis();
        let end = TimeStamp::from_seconds(t0_sec + 60).millis();
        let out = processor.get_range(store.connection(), start, end, 1).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].num_seconds_active, 60);
        assert!((out[0].value.value - 29.5).abs() < 1e-3);
    }

    #[test]
    fn s3_unaligned_90_second_window() {
        let (store, mut processor) = new_processor();
        add_one_per_second(&store, &mut processor, 0, (0..180).map(|i| i as f32));
        processor.flush(store.connection()).unwrap();

        for s in 30i64..60 {
            let start = TimeStamp::from_seconds(s).millis();
            let end = TimeStamp::from_seconds(s + 90).millis();
            let out = processor.get_range(store.connection(), start, end, 1).unwrap();
            let expected_mean: f32 = (s..s + 90).map(|i| i as f32).sum::<f32>() / 90.0;
            assert_eq!(out[0].num_seconds_active, 90, "window starting at {s}");
            assert!(
                (out[0].value.value - expected_mean).abs() < 1e-2,
                "window starting at {s}: got {} want {}",
                out[0].value.value,
                expected_mean
            );
        }
    }

    #[test]
    fn s4_inactivity_produces_exact_active_counts() {
        let (store, mut processor) = new_processor();
        let mut present = Vec::new();
        for i in 0..180i64 {
            if i % 10 != 0 {
                let ts = TimeStamp::from_seconds(i);
                processor.add(store.connection(), Reading::new(ts, StressIntensity { value: i as f32 })).unwrap();
                present.push(i as f32);
            }
        }
        processor.flush(store.connection()).unwrap();

        let out = processor
            .get_range(store.connection(), TimeStamp::from_seconds(0).millis(), TimeStamp::from_seconds(180).millis(), 1)
            .unwrap();
        let expected_mean = present.iter().sum::<f32>() / present.len() as f32;
        assert_eq!(out[0].num_seconds_active as usize, present.len());
        assert!((out[0].value.value - expected_mean).abs() < 1e-2);
    }

    #[test]
    fn law2_result_length_matches_n() {
        let (store, mut processor) = new_processor();
        add_one_per_second(&store, &mut processor, 0, (0..10).map(|i| i as f32));
        processor.flush(store.connection()).unwrap();

        let out = processor.get_range(store.connection(), 0, 10_000, 4).unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn law3_sub_interval_timestamps_are_evenly_spaced() {
        let (store, mut processor) = new_processor();
        add_one_per_second(&store, &mut processor, 0, (0..100).map(|i| i as f32));
        processor.flush(store.connection()).unwrap();

        let n = 5i64;
        let out = processor.get_range(store.connection(), 0, 100_000, n as usize).unwrap();
        for (i, summary) in out.iter().enumerate() {
            let expected = (i as f64 * 100_000.0 / n as f64).round() as i64 / 1_000;
            assert_eq!(summary.timestamp.seconds(), expected);
        }
    }

    #[test]
    fn law5_flush_is_idempotent() {
        let (store, mut processor) = new_processor();
        processor.add(store.connection(), Reading::new(TimeStamp::from_seconds(0), StressIntensity { value: 1.0 })).unwrap();
        processor.flush(store.connection()).unwrap();

        let before = processor
            .get_range(store.connection(), 0, TimeStamp::from_seconds(1).millis(), 1)
            .unwrap();
        processor.flush(store.connection()).unwrap();
        let after = processor
            .get_range(store.connection(), 0, TimeStamp::from_seconds(1).millis(), 1)
            .unwrap();
        assert_eq!(before[0].num_seconds_active, after[0].num_seconds_active);
        assert_eq!(before[0].value, after[0].value);
    }

    #[test]
    fn out_of_order_reading_is_dropped_silently() {
        let (store, mut processor) = new_processor();
        processor.add(store.connection(), Reading::new(TimeStamp::from_seconds(10), StressIntensity { value: 1.0 })).unwrap();
        processor.flush(store.connection()).unwrap();
        // Stale relative to the now-closed seconds chunk at index 10.
        let result = processor.add(store.connection(), Reading::new(TimeStamp::from_seconds(5), StressIntensity { value: 99.0 }));
        assert!(result.is_ok());
    }

    #[test]
    fn s5_pyramid_fallback_over_three_hours() {
        let (store, mut processor) = new_processor();
        let total_seconds = 3 * 3_600 + 10 * 60;
        add_one_per_second(&store, &mut processor, 0, (0..total_seconds).map(|i| i as f32));
        processor.flush(store.connection()).unwrap();

        let out = processor
            .get_range(store.connection(), 0, TimeStamp::from_seconds(total_seconds as i64).millis(), 1)
            .unwrap();
        let expected_mean = (0..total_seconds).map(|i| i as f32).sum::<f32>() / total_seconds as f32;
        assert_eq!(out[0].num_seconds_active as i64, total_seconds as i64);
        assert!((out[0].value.value - expected_mean).abs() < 1e-1);
    }
}
